//! Terminal preview EC using crossterm.
//!
//! Stands in for the fan: every RGB command the transport sends is decoded
//! and drawn as a row of true-color cells on one redrawn line.

use std::io::{self, Write};
use std::sync::Arc;

use crossterm::{
    cursor,
    style::{self, Color, Stylize},
    terminal, QueueableCommand,
};
use crosec_transport::{
    cmd, protocol, CommandPacket, EcDevice, EcHandle, PacketBuffer, Rgb, RgbWrite,
    TransportError,
};
use parking_lot::Mutex;

use crate::animation::LED_COUNT;
use crate::color;

/// Width of each LED cell in characters.
const CELL_W: usize = 4;

type Output = Arc<Mutex<Box<dyn Write + Send>>>;

/// EC device that renders RGB writes to a terminal
#[derive(Clone)]
pub struct TerminalPreview {
    out: Output,
    label: String,
    leds: Arc<Mutex<[Rgb; LED_COUNT]>>,
}

impl TerminalPreview {
    /// Preview on stdout
    pub fn stdout(label: impl Into<String>) -> Self {
        Self::with_writer(label, io::stdout())
    }

    pub fn with_writer(label: impl Into<String>, out: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(out))),
            label: label.into(),
            leds: Arc::new(Mutex::new([Rgb::BLACK; LED_COUNT])),
        }
    }

    /// Current state of the previewed LEDs
    pub fn leds(&self) -> [Rgb; LED_COUNT] {
        *self.leds.lock()
    }

    /// Apply one decoded write and redraw the line
    fn show(&self, write: &RgbWrite) -> io::Result<()> {
        let leds = {
            let mut leds = self.leds.lock();
            for (i, c) in write.colors.iter().enumerate() {
                if let Some(slot) = leds.get_mut(write.start_key as usize + i) {
                    *slot = *c;
                }
            }
            *leds
        };

        let mut out = self.out.lock();
        out.queue(cursor::MoveToColumn(0))?
            .queue(terminal::Clear(terminal::ClearType::CurrentLine))?
            .queue(style::PrintStyledContent(
                format!(" {} ", self.label).with(Color::White).on(Color::DarkGrey),
            ))?;
        for led in leds {
            out.queue(style::PrintStyledContent(
                " ".repeat(CELL_W).on(Color::Rgb {
                    r: led.r,
                    g: led.g,
                    b: led.b,
                }),
            ))?;
        }
        out.queue(style::Print(format!(
            " {}",
            leds.iter().map(|c| color::to_hex(*c)).collect::<Vec<_>>().join(" ")
        )))?;
        out.flush()
    }

    /// Finish the preview line
    pub fn finish(&self) -> io::Result<()> {
        let mut out = self.out.lock();
        out.queue(style::ResetColor)?.queue(style::Print("\n"))?;
        out.flush()
    }
}

impl EcDevice for TerminalPreview {
    fn open(&self) -> Result<Box<dyn EcHandle>, TransportError> {
        Ok(Box::new(PreviewHandle {
            preview: self.clone(),
        }))
    }

    fn describe(&self) -> String {
        format!("terminal preview ({})", self.label)
    }
}

struct PreviewHandle {
    preview: TerminalPreview,
}

impl EcHandle for PreviewHandle {
    fn exchange(&mut self, command: u16, packet: &mut PacketBuffer) -> Result<(), TransportError> {
        let mut request = CommandPacket::decode(packet);
        if request.command == cmd::RGBKBD_SET_COLOR as u32 {
            let write = protocol::decode_rgb_payload(request.payload())?;
            self.preview.show(&write).map_err(|e| TransportError::Io {
                command,
                code: e.raw_os_error().unwrap_or(-1),
            })?;
        }
        request.result = protocol::RESULT_SUCCESS;
        *packet = request.encode();
        Ok(())
    }
}
