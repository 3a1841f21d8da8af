use crate::{
    aux_bus::AuxBus,
    convert::Ingest,
    fifo::{self, FIFO_BUFFER_RECORDS, RECORD_SIZE},
    interface::{BusSpeed, Device},
    ll,
    sample::{Clock, HealthCounters, ImuSink},
    Error, Streaming, MPU9250,
};

impl<DEV: Device> MPU9250<DEV, Streaming> {
    /// One sampling tick: drain the FIFO into `sink`, then verify one
    /// checked register
    ///
    /// Never fails. Transport faults, corruption and overflow are recovered
    /// locally and show up in [`Self::counters`]. The tick is skipped if the
    /// bus lock is not immediately available.
    pub fn read_sample<K, C>(&mut self, sink: &mut K, clock: &C)
    where
        K: ImuSink,
        C: Clock,
    {
        let MPU9250 { ll, state } = self;
        if !ll.dev.try_lock() {
            return;
        }
        state.drain(ll, sink, clock);
        state.check_registers(ll);
        ll.dev.unlock();
    }

    pub fn counters(&self) -> &HealthCounters {
        &self.state.counters
    }

    /// Low pass filtered die temperature in °C
    pub fn temperature(&self) -> Option<f32> {
        self.state.converter.temperature()
    }

    pub fn is_fast_sampling(&self) -> bool {
        self.state.converter.is_downsampling()
    }

    pub fn data_ready(&mut self) -> Result<bool, DEV::Error> {
        self.ll.data_ready()
    }

    /// Auxiliary I2C master, SPI only
    pub fn aux_bus(&mut self) -> Result<AuxBus<'_, DEV>, Error<DEV::Error>> {
        AuxBus::acquire(&mut self.ll)
    }
}

impl Streaming {
    fn drain<DEV, K, C>(&mut self, ll: &mut ll::MPU9250<DEV>, sink: &mut K, clock: &C)
    where
        DEV: Device,
        K: ImuSink,
        C: Clock,
    {
        let Streaming {
            converter,
            oracle,
            buffer,
            counters,
            overflow,
        } = self;

        let Ok(pending) = ll.read_fifo_count() else {
            return;
        };
        let plan = overflow.plan(pending);
        if plan.records == 0 && !plan.reset_after {
            return;
        }
        if plan.reset_after {
            counters.overflow();
            warn!(
                "FIFO overflow: {} records pending, draining {}",
                usize::from(pending) / RECORD_SIZE,
                plan.records
            );
        }

        let mut remaining = plan.records;
        let mut reset_done = false;
        while remaining > 0 {
            let n = remaining.min(FIFO_BUFFER_RECORDS);
            let bytes = &mut buffer[..n * RECORD_SIZE];
            if ll.read_fifo(bytes).is_err() {
                // leave the FIFO alone, the register check reports the fault
                error!("error in FIFO read of {} bytes", n * RECORD_SIZE);
                return;
            }

            let mut ingest = Ingest {
                oracle: &mut *oracle,
                source: &mut *ll,
                sink: &mut *sink,
                clock,
                counters: &mut *counters,
            };
            if converter
                .process(fifo::records(bytes), &mut ingest)
                .is_err()
            {
                debug!(
                    "stop at {} of {}",
                    plan.records - remaining,
                    usize::from(pending) / RECORD_SIZE
                );
                Self::reset_fifo(ll, counters);
                reset_done = true;
                break;
            }
            remaining -= n;
        }

        if plan.reset_after && !reset_done {
            Self::reset_fifo(ll, counters);
        }
    }

    fn reset_fifo<DEV: Device>(ll: &mut ll::MPU9250<DEV>, counters: &mut HealthCounters) {
        counters.fifo_reset();
        if ll.fifo_reset().is_err() {
            error!("FIFO reset failed");
        }
    }

    fn check_registers<DEV: Device>(&mut self, ll: &mut ll::MPU9250<DEV>) {
        ll.dev.set_speed(BusSpeed::Low);
        if !ll.dev.check_next_register() {
            self.counters.bus_error();
        }
        ll.dev.set_speed(BusSpeed::High);
    }
}
