use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use crossterm::terminal;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::{Duration, Instant};
use tracing::debug;

/// a hex key going down or coming back up; keys are 0x0-0xf
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyEvent {
    Down(u8),
    Up(u8),
}

/// what the host bridge hands to the interpreter loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    Quit,
}

/// map of characters typed at the keyboard to what the chip8 might expect
/// where '1' => 0x01 and 'a' => 0x0a
const CHIP8_LITERAL_KEYMAP: [(char, u8); 16] = [
    ('0', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('4', 0x04),
    ('5', 0x05),
    ('6', 0x06),
    ('7', 0x07),
    ('8', 0x08),
    ('9', 0x09),
    ('a', 0x0a),
    ('b', 0x0b),
    ('c', 0x0c),
    ('d', 0x0d),
    ('e', 0x0e),
    ('f', 0x0f),
];

/// ditto using left-hand side of qwerty keyboard
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keymap {
    /// 1234/qwer/asdf/zxcv laid out like the COSMAC VIP keypad
    Conventional,
    /// 0-9 and a-f
    Literal,
}

impl Keymap {
    pub fn table(&self) -> HashMap<char, u8> {
        match self {
            Keymap::Conventional => HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            Keymap::Literal => HashMap::from(CHIP8_LITERAL_KEYMAP),
        }
    }
}

/// reads keypresses
pub trait Input {
    /// everything that happened since the last poll; never blocks
    fn poll(&mut self) -> Result<Vec<InputEvent>, io::Error>;
}

/// Terminals report presses (and auto-repeats) but not releases. A key is
/// held from its first press until it has gone `hold` without repeating.
pub struct KeyLatch {
    held: [Option<Instant>; 16],
    hold: Duration,
}

impl KeyLatch {
    pub fn new(hold: Duration) -> Self {
        KeyLatch {
            held: [None; 16],
            hold,
        }
    }

    /// a press (or repeat) seen at `now`; only the first one is a key-down
    pub fn press(&mut self, key: u8, now: Instant) -> Option<KeyEvent> {
        let slot = &mut self.held[(key & 0x0f) as usize];
        let fresh = slot.is_none();
        *slot = Some(now);
        fresh.then(|| KeyEvent::Down(key & 0x0f))
    }

    /// release every key that has not repeated recently
    pub fn expire(&mut self, now: Instant) -> Vec<KeyEvent> {
        let mut released = Vec::new();
        for (key, slot) in self.held.iter_mut().enumerate() {
            if let Some(t) = *slot {
                if now.duration_since(t) >= self.hold {
                    *slot = None;
                    released.push(KeyEvent::Up(key as u8));
                }
            }
        }
        released
    }
}

/// keypad on the controlling terminal, read with crossterm in raw mode
pub struct TermInput {
    keymap: HashMap<char, u8>,
    latch: KeyLatch,
}

impl TermInput {
    pub fn new(keymap: Keymap, hold: Duration) -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TermInput {
            keymap: keymap.table(),
            latch: KeyLatch::new(hold),
        })
    }

    fn read_terminal(&mut self, events: &mut Vec<InputEvent>) -> Result<(), io::Error> {
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                match evt.code {
                    KeyCode::Esc => events.push(InputEvent::Quit),
                    KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                        events.push(InputEvent::Quit)
                    }
                    KeyCode::Char(c) => match self.keymap.get(&c.to_ascii_lowercase()) {
                        Some(key) => {
                            if let Some(down) = self.latch.press(*key, Instant::now()) {
                                events.push(InputEvent::Key(down));
                            }
                        }
                        None => debug!(?c, "no keypad mapping"),
                    },
                    other => debug!(?other, "ignoring key"),
                }
            }
        }
        Ok(())
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for TermInput {
    fn poll(&mut self) -> Result<Vec<InputEvent>, io::Error> {
        let mut events = Vec::new();
        self.read_terminal(&mut events)?;
        events.extend(
            self.latch
                .expire(Instant::now())
                .into_iter()
                .map(InputEvent::Key),
        );
        Ok(events)
    }
}

/// dummy Input implementation for testing; each poll hands out the next
/// batch, then nothing once they run out
pub struct DummyInput {
    batches: VecDeque<Vec<InputEvent>>,
}

impl DummyInput {
    pub fn new(batches: Vec<Vec<InputEvent>>) -> Self {
        DummyInput {
            batches: batches.into(),
        }
    }
}

impl Input for DummyInput {
    fn poll(&mut self) -> Result<Vec<InputEvent>, io::Error> {
        Ok(self.batches.pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keymaps_cover_every_key() {
        for keymap in [Keymap::Conventional, Keymap::Literal] {
            let mut keys: Vec<u8> = keymap.table().values().copied().collect();
            keys.sort_unstable();
            assert_eq!(keys, (0..16).collect::<Vec<u8>>());
        }
        assert_eq!(Keymap::Conventional.table()[&'a'], 0x07);
        assert_eq!(Keymap::Literal.table()[&'a'], 0x0a);
    }

    #[test]
    fn test_latch_press_once() {
        let t0 = Instant::now();
        let mut latch = KeyLatch::new(Duration::from_millis(100));
        assert_eq!(latch.press(5, t0), Some(KeyEvent::Down(5)));
        // auto-repeat keeps it held without another key-down
        assert_eq!(latch.press(5, t0 + Duration::from_millis(50)), None);
        assert!(latch.expire(t0 + Duration::from_millis(120)).is_empty());
        assert_eq!(
            latch.expire(t0 + Duration::from_millis(150)),
            vec![KeyEvent::Up(5)]
        );
        assert_eq!(
            latch.press(5, t0 + Duration::from_millis(200)),
            Some(KeyEvent::Down(5))
        );
    }

    #[test]
    fn test_latch_releases_independently() {
        let t0 = Instant::now();
        let mut latch = KeyLatch::new(Duration::from_millis(100));
        latch.press(1, t0);
        latch.press(2, t0 + Duration::from_millis(60));
        assert_eq!(
            latch.expire(t0 + Duration::from_millis(100)),
            vec![KeyEvent::Up(1)]
        );
        assert_eq!(
            latch.expire(t0 + Duration::from_millis(160)),
            vec![KeyEvent::Up(2)]
        );
    }

    #[test]
    fn test_dummy_input_batches() -> Result<(), io::Error> {
        let mut input = DummyInput::new(vec![
            vec![InputEvent::Key(KeyEvent::Down(1))],
            vec![InputEvent::Quit],
        ]);
        assert_eq!(input.poll()?, vec![InputEvent::Key(KeyEvent::Down(1))]);
        assert_eq!(input.poll()?, vec![InputEvent::Quit]);
        assert!(input.poll()?.is_empty());
        Ok(())
    }
}
