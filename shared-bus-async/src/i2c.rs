use embassy_sync::{blocking_mutex::raw::RawMutex, mutex::Mutex};
use embedded_hal::i2c::{Operation, SevenBitAddress};
use embedded_hal_async::i2c::{self, I2c};

/// `Mutex`-based shared bus [`I2cDevice`](embedded_hal_async::i2c::I2c)
/// implementation.
///
/// This allows for sharing an I2C bus, obtaining multiple [`MutexI2cDevice`]
/// instances, each typically talking to a different address.
///
/// The mutex is held for the duration of a single `transaction` call, so
/// concurrent users are serialized per discrete bus transaction and never
/// across a multi-step exchange.
pub struct MutexI2cDevice<'a, M, I2cType, ErrorType>
where
    M: RawMutex,
    I2cType: I2c<SevenBitAddress, Error = ErrorType>,
    ErrorType: embedded_hal_async::i2c::Error,
{
    bus: &'a Mutex<M, I2cType>,
}

impl<'a, M, I2cType, ErrorType> MutexI2cDevice<'a, M, I2cType, ErrorType>
where
    M: RawMutex,
    I2cType: I2c<SevenBitAddress, Error = ErrorType>,
    ErrorType: embedded_hal_async::i2c::Error,
{
    /// Create a new [`MutexI2cDevice`] on a shared bus.
    pub fn new(bus: &'a Mutex<M, I2cType>) -> Self {
        Self { bus }
    }
}

impl<'a, M, I2cType, ErrorType> i2c::ErrorType for MutexI2cDevice<'a, M, I2cType, ErrorType>
where
    M: RawMutex,
    I2cType: I2c<SevenBitAddress, Error = ErrorType>,
    ErrorType: embedded_hal_async::i2c::Error,
{
    type Error = ErrorType;
}

impl<'a, M, I2cType, ErrorType> i2c::I2c for MutexI2cDevice<'a, M, I2cType, ErrorType>
where
    M: RawMutex,
    I2cType: I2c<SevenBitAddress, Error = ErrorType>,
    ErrorType: embedded_hal_async::i2c::Error,
{
    async fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut bus = self.bus.lock().await;
        bus.transaction(address, operations).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embedded_hal::i2c::ErrorKind;

    /// Records (address, written bytes) pairs and answers reads with zeroes.
    struct TraceBus {
        writes: Vec<(u8, Vec<u8>)>,
    }

    impl i2c::ErrorType for TraceBus {
        type Error = ErrorKind;
    }

    impl I2c for TraceBus {
        async fn transaction(
            &mut self,
            address: SevenBitAddress,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        self.writes.push((address, bytes.to_vec()));
                    }
                    Operation::Read(buf) => buf.fill(0),
                }
            }
            Ok(())
        }
    }

    #[test]
    fn devices_share_one_bus() {
        let bus: Mutex<CriticalSectionRawMutex, _> =
            Mutex::new(TraceBus { writes: Vec::new() });
        block_on(async {
            let mut dev_a = MutexI2cDevice::new(&bus);
            let mut dev_b = MutexI2cDevice::new(&bus);
            dev_a.write(0x15, &[0x64, 0x00, 0x00]).await.unwrap();
            dev_b.write(0x17, &[0x0A]).await.unwrap();
            dev_a.write(0x15, &[0x64, 0xD4, 0xF5]).await.unwrap();
        });
        let inner = bus.try_lock().unwrap();
        assert_eq!(
            inner.writes,
            vec![
                (0x15, vec![0x64, 0x00, 0x00]),
                (0x17, vec![0x0A]),
                (0x15, vec![0x64, 0xD4, 0xF5]),
            ]
        );
    }

    #[test]
    fn read_goes_through_the_lock() {
        let bus: Mutex<CriticalSectionRawMutex, _> =
            Mutex::new(TraceBus { writes: Vec::new() });
        let mut dev = MutexI2cDevice::new(&bus);
        let mut buf = [0xFFu8; 8];
        block_on(dev.write_read(0x15, &[0x6A], &mut buf)).unwrap();
        assert_eq!(buf, [0u8; 8]);
    }
}
