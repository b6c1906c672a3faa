//! SH1106 OLED panel driver
//!
//! Driver for 128x64 SH1106-based OLED panels on I2C. Every bus write is
//! emitted as one START…END transaction on a [`MessageSink`]:
//!
//! - commands: control byte `0x00` followed by command bytes
//! - pixel data: control byte `0x40` followed by at most
//!   `TRANSACTION_CAPACITY - 1` data bytes, so page data is split into
//!   several transactions
//!
//! Each operation begins with `INIT` for the panel's device, which makes
//! its session the active one before any bytes are buffered.

use panelbus_core::{
    Delay, DelayUnit, Device, Message, MessageSink, TransportError, TRANSACTION_CAPACITY,
};
use panelbus_hal::Sleep;

/// Display dimensions
pub const WIDTH: usize = 128;
pub const HEIGHT: usize = 64;
pub const PAGES: usize = HEIGHT / 8;

/// Control byte announcing command bytes
const CONTROL_COMMAND: u8 = 0x00;
/// Control byte announcing display RAM data
const CONTROL_DATA: u8 = 0x40;

/// Data bytes per transaction, after the control byte
const DATA_CHUNK: usize = TRANSACTION_CAPACITY - 1;

/// The SH1106 RAM is 132 columns wide; 128-pixel panels start at column 2
const COLUMN_OFFSET: u8 = 2;

/// Wait after power-up before the first command
const POWER_UP_DELAY_MS: u32 = 100;

/// SH1106 commands
#[allow(dead_code)]
mod cmd {
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const SET_CONTRAST: u8 = 0x81;
    pub const SET_NORMAL: u8 = 0xA6;
    pub const SET_INVERSE: u8 = 0xA7;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_COM_PINS: u8 = 0xDA;
    pub const SET_VCOM_DETECT: u8 = 0xDB;
    pub const SET_CLOCK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_MUX_RATIO: u8 = 0xA8;
    pub const SET_LOW_COLUMN: u8 = 0x00;
    pub const SET_HIGH_COLUMN: u8 = 0x10;
    pub const SET_PAGE_ADDR: u8 = 0xB0;
    pub const SET_START_LINE: u8 = 0x40;
    pub const SET_SEG_REMAP: u8 = 0xA1;
    pub const SET_COM_SCAN_DEC: u8 = 0xC8;
    pub const SET_CHARGE_PUMP: u8 = 0x8D;
}

/// Power-on initialization sequence; leaves the panel in power save
const INIT_SEQUENCE: &[u8] = &[
    cmd::DISPLAY_OFF,
    cmd::SET_CLOCK_DIV,
    0x80,
    cmd::SET_MUX_RATIO,
    0x3F, // 64 lines
    cmd::SET_DISPLAY_OFFSET,
    0x00,
    cmd::SET_START_LINE,
    cmd::SET_CHARGE_PUMP,
    0x14,
    cmd::SET_SEG_REMAP,
    cmd::SET_COM_SCAN_DEC,
    cmd::SET_COM_PINS,
    0x12,
    cmd::SET_CONTRAST,
    0xCF,
    cmd::SET_PRECHARGE,
    0xF1,
    cmd::SET_VCOM_DETECT,
    0x40,
    cmd::SET_NORMAL,
];

/// SH1106 panel with a local frame buffer
pub struct Sh1106 {
    device: Device,
    /// Frame buffer (1 bit per pixel, organized as pages)
    buffer: [[u8; WIDTH]; PAGES],
}

impl Sh1106 {
    /// Create a driver for the panel at `device`
    pub fn new(device: Device) -> Self {
        Self {
            device,
            buffer: [[0; WIDTH]; PAGES],
        }
    }

    /// The device this panel is addressed as
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Initialize the panel
    ///
    /// Opens the transport session, waits for the panel to power up and
    /// sends the init sequence. The panel stays in power save until
    /// [`set_power_save(false)`](Self::set_power_save).
    ///
    /// A failed power-up wait aborts init before any command is sent.
    pub fn init<T, S>(&mut self, sink: &mut T, delay: &mut Delay<S>) -> Result<(), TransportError>
    where
        T: MessageSink + ?Sized,
        S: Sleep,
    {
        sink.handle(Message::Init(&self.device))?;
        delay.delay(DelayUnit::Millis, POWER_UP_DELAY_MS)?;
        self.command(sink, INIT_SEQUENCE)
    }

    /// Enter or leave power save
    pub fn set_power_save<T>(&mut self, sink: &mut T, enabled: bool) -> Result<(), TransportError>
    where
        T: MessageSink + ?Sized,
    {
        let c = if enabled {
            cmd::DISPLAY_OFF
        } else {
            cmd::DISPLAY_ON
        };
        self.command(sink, &[c])
    }

    /// Set display contrast (0-255)
    pub fn set_contrast<T>(&mut self, sink: &mut T, contrast: u8) -> Result<(), TransportError>
    where
        T: MessageSink + ?Sized,
    {
        self.command(sink, &[cmd::SET_CONTRAST, contrast])
    }

    /// Invert display colors
    pub fn set_inverted<T>(&mut self, sink: &mut T, inverted: bool) -> Result<(), TransportError>
    where
        T: MessageSink + ?Sized,
    {
        let c = if inverted {
            cmd::SET_INVERSE
        } else {
            cmd::SET_NORMAL
        };
        self.command(sink, &[c])
    }

    /// Clear the frame buffer
    pub fn clear_buffer(&mut self) {
        for page in self.buffer.iter_mut() {
            page.fill(0);
        }
    }

    /// Set or clear one pixel; out-of-range coordinates are ignored
    pub fn set_pixel(&mut self, x: usize, y: usize, on: bool) {
        if x >= WIDTH || y >= HEIGHT {
            return;
        }
        let bit = 1 << (y % 8);
        let cell = &mut self.buffer[y / 8][x];
        if on {
            *cell |= bit;
        } else {
            *cell &= !bit;
        }
    }

    /// Check a pixel in the frame buffer
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < WIDTH && y < HEIGHT && self.buffer[y / 8][x] & (1 << (y % 8)) != 0
    }

    /// Invert columns `start_x..end_x` of one page
    pub fn invert_region(&mut self, page: usize, start_x: usize, end_x: usize) {
        if page >= PAGES {
            return;
        }
        let end_x = end_x.min(WIDTH);
        for cell in self.buffer[page].iter_mut().take(end_x).skip(start_x) {
            *cell ^= 0xFF;
        }
    }

    /// Flush the frame buffer to the panel
    pub fn flush<T>(&mut self, sink: &mut T) -> Result<(), TransportError>
    where
        T: MessageSink + ?Sized,
    {
        for page in 0..PAGES {
            self.command(
                sink,
                &[
                    cmd::SET_PAGE_ADDR | page as u8,
                    cmd::SET_LOW_COLUMN | (COLUMN_OFFSET & 0x0F),
                    cmd::SET_HIGH_COLUMN | (COLUMN_OFFSET >> 4),
                ],
            )?;

            // Column address auto-increments across transactions
            for chunk in self.buffer[page].chunks(DATA_CHUNK) {
                sink.transaction(&[&[CONTROL_DATA], chunk])?;
            }
        }

        Ok(())
    }

    /// Send a command transaction to this panel
    fn command<T>(&self, sink: &mut T, commands: &[u8]) -> Result<(), TransportError>
    where
        T: MessageSink + ?Sized,
    {
        sink.handle(Message::Init(&self.device))?;
        sink.transaction(&[&[CONTROL_COMMAND], commands])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use heapless::Vec;
    use panelbus_core::{DeviceConfig, DeviceId, DeviceRegistry};
    use panelbus_hal::{OsError, SleepError};

    /// Sink recording each completed transaction
    #[derive(Default)]
    struct RecordingSink {
        transactions: Vec<Vec<u8, TRANSACTION_CAPACITY>, 64>,
        current: Vec<u8, TRANSACTION_CAPACITY>,
        inits: Vec<DeviceId, 64>,
        aux_seen: bool,
    }

    impl MessageSink for RecordingSink {
        fn handle(&mut self, message: Message<'_>) -> Result<(), TransportError> {
            match message {
                Message::Init(device) => {
                    let _ = self.inits.push(device.id());
                }
                Message::Start => self.current.clear(),
                Message::Send(bytes) => {
                    self.current
                        .extend_from_slice(bytes)
                        .map_err(|_| TransportError::NotInitialized)?;
                }
                Message::SetAux(_) => self.aux_seen = true,
                Message::End => {
                    let _ = self.transactions.push(self.current.clone());
                }
            }
            Ok(())
        }
    }

    /// Sleep adding up the requested time
    #[derive(Default)]
    struct RecordingSleep {
        total: Duration,
    }

    impl Sleep for RecordingSleep {
        fn sleep(&mut self, duration: Duration) -> Result<(), SleepError> {
            self.total += duration;
            Ok(())
        }
    }

    struct FailingSleep;

    impl Sleep for FailingSleep {
        fn sleep(&mut self, _duration: Duration) -> Result<(), SleepError> {
            Err(SleepError::Os(OsError(22)))
        }
    }

    fn panel(index: usize) -> Sh1106 {
        let registry = DeviceRegistry::from_config(
            &[DeviceConfig::direct(1, 0x3C), DeviceConfig::direct(1, 0x3D)],
            false,
        )
        .unwrap();
        Sh1106::new(*registry.get(index).unwrap())
    }

    #[test]
    fn test_init_sequence_fits_one_transaction() {
        let mut sink = RecordingSink::default();
        let mut delay = Delay::new(RecordingSleep::default());
        let mut panel = panel(1);

        panel.init(&mut sink, &mut delay).unwrap();

        assert_eq!(delay.into_inner().total, Duration::from_millis(100));
        assert_eq!(sink.transactions.len(), 1);
        let tx = &sink.transactions[0];
        assert_eq!(tx[0], CONTROL_COMMAND);
        assert_eq!(&tx[1..], INIT_SEQUENCE);
        assert!(sink.inits.iter().all(|id| *id == DeviceId(1)));
    }

    #[test]
    fn test_init_stops_when_power_up_wait_fails() {
        let mut sink = RecordingSink::default();
        let mut delay = Delay::new(FailingSleep);
        let mut panel = panel(0);

        assert_eq!(
            panel.init(&mut sink, &mut delay),
            Err(TransportError::TimingFailure { os: OsError(22) })
        );
        assert!(sink.transactions.is_empty());
    }

    #[test]
    fn test_power_save_and_contrast() {
        let mut sink = RecordingSink::default();
        let mut panel = panel(0);

        panel.set_power_save(&mut sink, false).unwrap();
        panel.set_power_save(&mut sink, true).unwrap();
        panel.set_contrast(&mut sink, 0x7F).unwrap();
        panel.set_inverted(&mut sink, true).unwrap();

        let txs: Vec<&[u8], 8> = sink.transactions.iter().map(|t| t.as_slice()).collect();
        assert_eq!(
            txs.as_slice(),
            &[
                &[0x00, 0xAF][..],
                &[0x00, 0xAE][..],
                &[0x00, 0x81, 0x7F][..],
                &[0x00, 0xA7][..],
            ]
        );
    }

    #[test]
    fn test_flush_chunks_page_data() {
        let mut sink = RecordingSink::default();
        let mut panel = panel(0);
        panel.set_pixel(0, 0, true);
        panel.set_pixel(127, 63, true);

        panel.flush(&mut sink).unwrap();

        let chunks_per_page = WIDTH.div_ceil(DATA_CHUNK);
        assert_eq!(sink.transactions.len(), PAGES * (1 + chunks_per_page));
        assert!(sink
            .transactions
            .iter()
            .all(|t| t.len() <= TRANSACTION_CAPACITY));

        // Page 0 address, then first data chunk carrying pixel (0, 0)
        assert_eq!(sink.transactions[0].as_slice(), &[0x00, 0xB0, 0x02, 0x10]);
        assert_eq!(sink.transactions[1][0], CONTROL_DATA);
        assert_eq!(sink.transactions[1][1], 0x01);

        // Last chunk of page 7 ends with pixel (127, 63)
        let last = sink.transactions.last().unwrap();
        assert_eq!(*last.last().unwrap(), 0x80);

        let data_bytes: usize = sink
            .transactions
            .iter()
            .filter(|t| t[0] == CONTROL_DATA)
            .map(|t| t.len() - 1)
            .sum();
        assert_eq!(data_bytes, WIDTH * PAGES);
    }

    #[test]
    fn test_pixels_and_regions() {
        let mut panel = panel(0);
        panel.set_pixel(3, 9, true);
        assert!(panel.pixel(3, 9));
        panel.set_pixel(3, 9, false);
        assert!(!panel.pixel(3, 9));

        // Out of range is ignored
        panel.set_pixel(WIDTH, 0, true);
        assert!(!panel.pixel(WIDTH, 0));

        panel.invert_region(0, 0, 16);
        assert!(panel.pixel(15, 7));
        assert!(!panel.pixel(16, 0));

        panel.clear_buffer();
        assert!(!panel.pixel(15, 7));
    }

    #[test]
    fn test_every_operation_activates_its_device() {
        let mut sink = RecordingSink::default();
        let mut panel = panel(1);
        panel.flush(&mut sink).unwrap();
        assert_eq!(sink.inits.len(), PAGES);
        assert!(sink.inits.iter().all(|id| *id == DeviceId(1)));
        assert!(!sink.aux_seen);
    }
}
