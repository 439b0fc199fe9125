pub mod gpio;
pub mod i2c;

use async_trait::async_trait;
use serde::Deserialize;
use crate::errors::BusResult;

/// Kind of a configured bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    I2c,
    Gpio,
}

/// Byte-wide register access to a device on a two-wire bus
#[async_trait]
pub trait RegisterBus: Send {
    async fn write_reg(&mut self, address: u8, reg: u8, value: u8) -> BusResult<()>;
    async fn read_reg(&mut self, address: u8, reg: u8) -> BusResult<u8>;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::RegisterBus;
    use crate::errors::BusResult;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// In-memory register file that records every write
    #[derive(Debug, Default)]
    pub struct MockBus {
        pub regs: HashMap<u8, u8>,
        pub writes: Vec<(u8, u8, u8)>,
        /// Fail the write with this (zero-based) sequence number
        pub fail_write_at: Option<usize>,
        pub fail_reads: bool,
    }

    impl MockBus {
        pub fn with_reg(mut self, reg: u8, value: u8) -> Self {
            self.regs.insert(reg, value);
            self
        }
    }

    fn nack() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::Other, "no acknowledge")
    }

    #[async_trait]
    impl RegisterBus for MockBus {
        async fn write_reg(&mut self, address: u8, reg: u8, value: u8) -> BusResult<()> {
            if self.fail_write_at == Some(self.writes.len()) {
                return Err(nack().into());
            }
            self.writes.push((address, reg, value));
            self.regs.insert(reg, value);
            Ok(())
        }

        async fn read_reg(&mut self, _address: u8, reg: u8) -> BusResult<u8> {
            if self.fail_reads {
                return Err(nack().into());
            }
            Ok(self.regs.get(&reg).copied().unwrap_or(0))
        }
    }
}
