//! Simulated EtherCAT master.

use super::drive::SimulatedDrive;
use ecat_common::config::ToolConfig;
use ecat_common::od::client::{DeviceAddress, DictionaryClient, OdError, SlaveInfo};
use ecat_common::od::types::DictionaryAddress;
use serde::Serialize;
use std::collections::HashMap;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Kind of a journaled access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessKind {
    /// SDO upload (read).
    Upload,
    /// SDO download (write).
    Download,
}

/// One access attempted against the simulated bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    /// Read or write.
    pub kind: AccessKind,
    /// Target slave.
    pub device: DeviceAddress,
    /// Entry accessed.
    pub address: DictionaryAddress,
    /// Value written, or read on success (0 on a failed read).
    pub value: u64,
    /// Whether the access succeeded.
    pub ok: bool,
}

/// Master with a bus of simulated drives.
#[derive(Debug)]
pub struct SimulatedMaster {
    index: u32,
    drives: Vec<SimulatedDrive>,
    access_timeout: Duration,
    journal: Vec<JournalEntry>,
    journal_limit: usize,
    failures: HashMap<(AccessKind, u16, u8), OdError>,
    unresponsive: bool,
}

impl SimulatedMaster {
    /// Create the master and slaves described by `config.simulation`.
    pub fn from_config(config: &ToolConfig) -> Self {
        let drives: Vec<SimulatedDrive> = config
            .simulation
            .slaves
            .iter()
            .map(SimulatedDrive::new)
            .collect();
        info!(
            master = config.simulation.master,
            slaves = drives.len(),
            "Simulated bus created"
        );
        Self {
            index: config.simulation.master,
            drives,
            access_timeout: config.client.access_timeout(),
            journal: Vec::new(),
            journal_limit: config.simulation.journal_limit,
            failures: HashMap::new(),
            unresponsive: false,
        }
    }

    /// Accesses attempted so far, oldest first, at most `journal_limit` of them.
    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    /// Attempted accesses of one kind, in order.
    pub fn accesses(&self, kind: AccessKind) -> Vec<&JournalEntry> {
        self.journal.iter().filter(|e| e.kind == kind).collect()
    }

    /// Forget the journal.
    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Make every access of `kind` to `address` fail with `error`.
    pub fn inject_failure(&mut self, kind: AccessKind, address: DictionaryAddress, error: OdError) {
        self.failures
            .insert((kind, address.index, address.subindex), error);
    }

    /// Remove all injected failures.
    pub fn clear_failures(&mut self) {
        self.failures.clear();
    }

    /// Simulate a link loss.
    pub fn set_unresponsive(&mut self, unresponsive: bool) {
        self.unresponsive = unresponsive;
    }

    /// Drive at `position`.
    pub fn drive(&self, position: u16) -> Option<&SimulatedDrive> {
        self.drives.iter().find(|d| d.info().position == position)
    }

    /// Mutable drive at `position`.
    pub fn drive_mut(&mut self, position: u16) -> Option<&mut SimulatedDrive> {
        self.drives.iter_mut().find(|d| d.info().position == position)
    }

    /// Common checks of an access; returns the drive's index on the bus.
    fn prepare(
        &self,
        kind: AccessKind,
        device: &DeviceAddress,
        address: &DictionaryAddress,
    ) -> Result<usize, OdError> {
        if device.master != self.index {
            return Err(OdError::MasterNotFound(device.master));
        }
        if self.unresponsive {
            return Err(OdError::Unreachable(format!("slave {device}")));
        }
        let slot = self
            .drives
            .iter()
            .position(|d| d.info().position == device.position)
            .ok_or(OdError::SlaveNotFound {
                master: device.master,
                position: device.position,
            })?;

        let latency = self.drives[slot].latency();
        if latency > self.access_timeout {
            thread::sleep(self.access_timeout);
            return Err(OdError::Timeout {
                address: *address,
                timeout: self.access_timeout,
            });
        }
        if !latency.is_zero() {
            thread::sleep(latency);
        }

        if let Some(error) = self.failures.get(&(kind, address.index, address.subindex)) {
            return Err(error.clone());
        }
        Ok(slot)
    }

    fn log(
        &mut self,
        kind: AccessKind,
        device: &DeviceAddress,
        address: &DictionaryAddress,
        value: u64,
        ok: bool,
    ) {
        if self.journal_limit == 0 {
            return;
        }
        if self.journal.len() >= self.journal_limit {
            let excess = self.journal.len() + 1 - self.journal_limit;
            self.journal.drain(..excess);
        }
        self.journal.push(JournalEntry {
            kind,
            device: *device,
            address: *address,
            value,
            ok,
        });
    }
}

impl DictionaryClient for SimulatedMaster {
    fn name(&self) -> &'static str {
        super::NAME
    }

    fn masters(&self) -> Vec<u32> {
        vec![self.index]
    }

    fn slaves(&mut self, master: u32) -> Result<Vec<SlaveInfo>, OdError> {
        if master != self.index {
            return Err(OdError::MasterNotFound(master));
        }
        let mut slaves: Vec<SlaveInfo> = self.drives.iter().map(|d| d.info().clone()).collect();
        slaves.sort_by_key(|s| s.position);
        Ok(slaves)
    }

    fn upload(
        &mut self,
        device: &DeviceAddress,
        address: &DictionaryAddress,
    ) -> Result<u64, OdError> {
        let result = self
            .prepare(AccessKind::Upload, device, address)
            .and_then(|slot| self.drives[slot].read(address));
        debug!(%device, %address, ok = result.is_ok(), "Simulated upload");
        self.log(
            AccessKind::Upload,
            device,
            address,
            result.as_ref().map_or(0, |v| *v),
            result.is_ok(),
        );
        result
    }

    fn download(
        &mut self,
        device: &DeviceAddress,
        address: &DictionaryAddress,
        value: u64,
    ) -> Result<(), OdError> {
        let result = self
            .prepare(AccessKind::Download, device, address)
            .and_then(|slot| self.drives[slot].write(address, value));
        debug!(%device, %address, value, ok = result.is_ok(), "Simulated download");
        self.log(AccessKind::Download, device, address, value, result.is_ok());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecat_common::config::SimSlaveConfig;
    use ecat_common::drive::objects::{CONTROL_WORD, STATUS_WORD};
    use ecat_common::drive::state::PowerState;

    const DEVICE: DeviceAddress = DeviceAddress {
        master: 0,
        position: 0,
    };

    fn master() -> SimulatedMaster {
        SimulatedMaster::from_config(&ToolConfig::default())
    }

    #[test]
    fn lists_configured_slaves() {
        let mut config = ToolConfig::default();
        config.simulation.slaves.push(SimSlaveConfig {
            position: 1,
            alias: 7,
            name: "EPOS3".to_string(),
            initial_fault: false,
            latency_ms: 0,
        });
        let mut m = SimulatedMaster::from_config(&config);
        assert_eq!(m.masters(), vec![0]);
        let slaves = m.slaves(0).unwrap();
        assert_eq!(slaves.len(), 2);
        assert_eq!(slaves[1].alias, 7);
        assert_eq!(m.slaves(1), Err(OdError::MasterNotFound(1)));
    }

    #[test]
    fn journal_records_attempts() {
        let mut m = master();
        m.download(&DEVICE, &CONTROL_WORD, 0x0006).unwrap();
        let status = m.upload(&DEVICE, &STATUS_WORD).unwrap();
        assert_eq!(
            PowerState::from_raw(status as u16),
            PowerState::ReadyToSwitchOn
        );
        assert!(m.download(&DEVICE, &STATUS_WORD, 0).is_err());

        let journal = m.journal();
        assert_eq!(journal.len(), 3);
        assert_eq!(journal[0].kind, AccessKind::Download);
        assert_eq!(journal[1].value, status);
        assert!(!journal[2].ok);
    }

    #[test]
    fn unknown_slave_and_unreachable() {
        let mut m = master();
        let other = DeviceAddress {
            master: 0,
            position: 5,
        };
        assert!(matches!(
            m.upload(&other, &STATUS_WORD),
            Err(OdError::SlaveNotFound { position: 5, .. })
        ));

        m.set_unresponsive(true);
        assert!(matches!(
            m.upload(&DEVICE, &STATUS_WORD),
            Err(OdError::Unreachable(_))
        ));
    }

    #[test]
    fn injected_failure_applies_to_one_address() {
        let mut m = master();
        m.inject_failure(
            AccessKind::Download,
            CONTROL_WORD,
            OdError::Aborted { code: 0x0609_0011 },
        );
        assert_eq!(
            m.download(&DEVICE, &CONTROL_WORD, 6),
            Err(OdError::Aborted { code: 0x0609_0011 })
        );
        assert!(m.upload(&DEVICE, &STATUS_WORD).is_ok());
        m.clear_failures();
        assert!(m.download(&DEVICE, &CONTROL_WORD, 6).is_ok());
    }

    #[test]
    fn journal_keeps_most_recent_accesses() {
        let mut config = ToolConfig::default();
        config.simulation.journal_limit = 3;
        let mut m = SimulatedMaster::from_config(&config);
        for word in [0x0006, 0x0007, 0x000F, 0x001F, 0x000F] {
            m.download(&DEVICE, &CONTROL_WORD, word).unwrap();
        }
        let values: Vec<u64> = m.journal().iter().map(|e| e.value).collect();
        assert_eq!(values, vec![0x000F, 0x001F, 0x000F]);

        config.simulation.journal_limit = 0;
        let mut m = SimulatedMaster::from_config(&config);
        m.download(&DEVICE, &CONTROL_WORD, 0x0006).unwrap();
        assert!(m.journal().is_empty());
    }

    #[test]
    fn latency_beyond_timeout_times_out() {
        let mut config = ToolConfig::default();
        config.client.access_timeout_ms = 1;
        config.simulation.slaves[0].latency_ms = 50;
        let mut m = SimulatedMaster::from_config(&config);
        assert!(matches!(
            m.upload(&DEVICE, &STATUS_WORD),
            Err(OdError::Timeout { .. })
        ));
    }
}
