//! Built-in wiring suggestions for common peripherals on ESP32 boards
//!
//! Pin defaults follow the Arduino-ESP32 core's `pins_arduino.h` for each board.
//! Anything not in these tables is handed back to the assistant as a hint.

use crate::tools::types::{BoardInfo, ConnectionGuideResult, PinConnection};

/// Default pin assignments for a board
#[derive(Debug, Clone, Copy)]
pub struct BoardPinout {
    pub board_id: &'static str,
    pub chip: &'static str,
    pub sda: &'static str,
    pub scl: &'static str,
    pub mosi: &'static str,
    pub miso: &'static str,
    pub sck: &'static str,
    pub cs: &'static str,
    /// Free GPIOs safe for single-wire peripherals (not strapping pins)
    pub gpio: [&'static str; 2],
}

pub const BOARDS: &[BoardPinout] = &[
    BoardPinout {
        board_id: "esp32dev",
        chip: "ESP32",
        sda: "GPIO21",
        scl: "GPIO22",
        mosi: "GPIO23",
        miso: "GPIO19",
        sck: "GPIO18",
        cs: "GPIO5",
        gpio: ["GPIO4", "GPIO16"],
    },
    BoardPinout {
        board_id: "esp32-s3-devkitc-1",
        chip: "ESP32-S3",
        sda: "GPIO8",
        scl: "GPIO9",
        mosi: "GPIO11",
        miso: "GPIO13",
        sck: "GPIO12",
        cs: "GPIO10",
        gpio: ["GPIO4", "GPIO5"],
    },
    BoardPinout {
        board_id: "esp32-c3-devkitm-1",
        chip: "ESP32-C3",
        sda: "GPIO8",
        scl: "GPIO9",
        mosi: "GPIO6",
        miso: "GPIO5",
        sck: "GPIO4",
        cs: "GPIO7",
        gpio: ["GPIO3", "GPIO10"],
    },
    BoardPinout {
        board_id: "esp32-c6-devkitc-1",
        chip: "ESP32-C6",
        sda: "GPIO23",
        scl: "GPIO22",
        mosi: "GPIO19",
        miso: "GPIO20",
        sck: "GPIO21",
        cs: "GPIO18",
        gpio: ["GPIO4", "GPIO5"],
    },
    BoardPinout {
        board_id: "seeed_xiao_esp32c3",
        chip: "ESP32-C3",
        sda: "D4 (GPIO6)",
        scl: "D5 (GPIO7)",
        mosi: "D10 (GPIO10)",
        miso: "D9 (GPIO9)",
        sck: "D8 (GPIO8)",
        cs: "D7 (GPIO20)",
        gpio: ["D2 (GPIO4)", "D3 (GPIO5)"],
    },
    BoardPinout {
        board_id: "seeed_xiao_esp32s3",
        chip: "ESP32-S3",
        sda: "D4 (GPIO5)",
        scl: "D5 (GPIO6)",
        mosi: "D10 (GPIO9)",
        miso: "D9 (GPIO8)",
        sck: "D8 (GPIO7)",
        cs: "D7 (GPIO44)",
        gpio: ["D1 (GPIO2)", "D2 (GPIO3)"],
    },
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bus {
    /// I2C with the module's default 7-bit address
    I2c { address: &'static str },
    Spi,
    /// One data GPIO (DHT, 1-Wire, addressable LEDs)
    SingleGpio,
    /// Separate trigger and echo GPIOs (ultrasonic rangers)
    TriggerEcho,
}

impl Bus {
    pub fn name(&self) -> &'static str {
        match self {
            Bus::I2c { .. } => "i2c",
            Bus::Spi => "spi",
            Bus::SingleGpio => "gpio",
            Bus::TriggerEcho => "gpio",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PeripheralModule {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub bus: Bus,
    /// Supply pin to use on the board
    pub supply: &'static str,
    pub notes: &'static [&'static str],
}

pub const MODULES: &[PeripheralModule] = &[
    PeripheralModule {
        name: "BME280",
        aliases: &[],
        bus: Bus::I2c { address: "0x76" },
        supply: "3V3",
        notes: &["SDO to GND selects 0x76, SDO to 3V3 selects 0x77"],
    },
    PeripheralModule {
        name: "BMP280",
        aliases: &[],
        bus: Bus::I2c { address: "0x76" },
        supply: "3V3",
        notes: &["SDO to GND selects 0x76, SDO to 3V3 selects 0x77"],
    },
    PeripheralModule {
        name: "SSD1306",
        aliases: &["oled"],
        bus: Bus::I2c { address: "0x3C" },
        supply: "3V3",
        notes: &["Most 128x64 breakouts ship at 0x3C; some use 0x3D"],
    },
    PeripheralModule {
        name: "MPU6050",
        aliases: &["gy521"],
        bus: Bus::I2c { address: "0x68" },
        supply: "3V3",
        notes: &["AD0 high moves the address to 0x69"],
    },
    PeripheralModule {
        name: "SHT31",
        aliases: &[],
        bus: Bus::I2c { address: "0x44" },
        supply: "3V3",
        notes: &["ADDR high moves the address to 0x45"],
    },
    PeripheralModule {
        name: "DHT22",
        aliases: &["am2302"],
        bus: Bus::SingleGpio,
        supply: "3V3",
        notes: &["Add a 10k pull-up from DATA to 3V3 unless the breakout has one"],
    },
    PeripheralModule {
        name: "DS18B20",
        aliases: &["onewire"],
        bus: Bus::SingleGpio,
        supply: "3V3",
        notes: &["1-Wire bus needs a 4.7k pull-up from DQ to 3V3"],
    },
    PeripheralModule {
        name: "WS2812",
        aliases: &["neopixel", "sk6812"],
        bus: Bus::SingleGpio,
        supply: "5V",
        notes: &[
            "Put a 330 ohm resistor in series with DIN",
            "3.3V data at 5V supply is marginal; use a level shifter for long strips",
            "Power long strips from a separate 5V supply with a shared GND",
        ],
    },
    PeripheralModule {
        name: "HC-SR04",
        aliases: &["ultrasonic"],
        bus: Bus::TriggerEcho,
        supply: "5V",
        notes: &["ECHO is a 5V output: divide it down (e.g. 1k/2k) before the ESP32 pin"],
    },
    PeripheralModule {
        name: "MAX7219",
        aliases: &[],
        bus: Bus::Spi,
        supply: "5V",
        notes: &["MAX7219 has no data output; leave MISO unconnected"],
    },
    PeripheralModule {
        name: "SD card",
        aliases: &["microsd", "tfcard"],
        bus: Bus::Spi,
        supply: "3V3",
        notes: &["Use a 3.3V module or one with an on-board regulator and level shifting"],
    },
];

const UNKNOWN_HINT: &str = "This combination is not in the built-in tables. \
    Compose a connection guide from the board's pinout and the module's datasheet, \
    or ask the user to describe the hardware in more detail.";

/// Normalized chip families that must not fall back to another chip's pinout
const UNLISTED_FAMILIES: &[&str] = &["esp32s2", "esp32h2", "esp32p4", "esp32c2", "esp32c5", "esp32c61"];

/// Lowercase and drop everything but letters and digits
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Look up a board by id, falling back to the devkit of the same chip family
pub fn find_board(board_id: &str) -> Option<&'static BoardPinout> {
    let wanted = normalize(board_id);
    if let Some(board) = BOARDS.iter().find(|b| normalize(b.board_id) == wanted) {
        return Some(board);
    }

    // Chips with their own pin maps that the table has no devkit for
    if UNLISTED_FAMILIES.iter().any(|f| wanted.contains(f)) {
        return None;
    }

    let family = if wanted.contains("esp32s3") {
        "esp32-s3-devkitc-1"
    } else if wanted.contains("esp32c3") {
        "esp32-c3-devkitm-1"
    } else if wanted.contains("esp32c6") {
        "esp32-c6-devkitc-1"
    } else if wanted.starts_with("esp32") {
        "esp32dev"
    } else {
        return None;
    };
    BOARDS.iter().find(|b| b.board_id == family)
}

/// Match a free-form module description ("OLED SSD1306", "bme-280") to a known module
pub fn find_module(module: &str) -> Option<&'static PeripheralModule> {
    let wanted = normalize(module);
    if wanted.is_empty() {
        return None;
    }

    // Part numbers first so "OLED SSD1306" doesn't stop at an alias
    MODULES
        .iter()
        .find(|m| wanted.contains(&normalize(m.name)))
        .or_else(|| {
            MODULES
                .iter()
                .find(|m| m.aliases.iter().any(|a| wanted.contains(&normalize(a))))
        })
}

fn connect(module_pin: &str, board_pin: &str) -> PinConnection {
    PinConnection {
        module_pin: module_pin.to_string(),
        board_pin: board_pin.to_string(),
    }
}

fn wiring(board: &BoardPinout, module: &PeripheralModule) -> Vec<PinConnection> {
    let mut pins = vec![connect("VCC", module.supply), connect("GND", "GND")];
    match module.bus {
        Bus::I2c { .. } => {
            pins.push(connect("SDA", board.sda));
            pins.push(connect("SCL", board.scl));
        }
        Bus::Spi => {
            pins.push(connect("MOSI/DIN", board.mosi));
            pins.push(connect("MISO/DO", board.miso));
            pins.push(connect("SCK/CLK", board.sck));
            pins.push(connect("CS", board.cs));
        }
        Bus::SingleGpio => pins.push(connect("DATA", board.gpio[0])),
        Bus::TriggerEcho => {
            pins.push(connect("TRIG", board.gpio[0]));
            pins.push(connect("ECHO", board.gpio[1]));
        }
    }
    pins
}

/// Build a connection guide for `board_id` + `module`
pub fn connection_guide(board_id: &str, module: &str) -> ConnectionGuideResult {
    let (board, peripheral) = match (find_board(board_id), find_module(module)) {
        (Some(b), Some(m)) => (b, m),
        (board, _) => {
            return ConnectionGuideResult {
                board_id: board_id.to_string(),
                module: module.to_string(),
                known: false,
                chip: board.map(|b| b.chip.to_string()),
                bus: None,
                connections: Vec::new(),
                notes: Vec::new(),
                hint: Some(UNKNOWN_HINT.to_string()),
            };
        }
    };

    let mut notes = Vec::new();
    if normalize(board.board_id) != normalize(board_id) {
        notes.push(format!(
            "No pinout for '{}'; using {} defaults from {}",
            board_id, board.chip, board.board_id
        ));
    }
    if let Bus::I2c { address } = peripheral.bus {
        notes.push(format!("Default I2C address {}", address));
    }
    notes.extend(peripheral.notes.iter().map(|n| n.to_string()));

    ConnectionGuideResult {
        board_id: board_id.to_string(),
        module: peripheral.name.to_string(),
        known: true,
        chip: Some(board.chip.to_string()),
        bus: Some(peripheral.bus.name().to_string()),
        connections: wiring(board, peripheral),
        notes,
        hint: None,
    }
}

pub fn board_infos() -> Vec<BoardInfo> {
    BOARDS
        .iter()
        .map(|b| BoardInfo {
            board_id: b.board_id.to_string(),
            chip: b.chip.to_string(),
            i2c_sda: b.sda.to_string(),
            i2c_scl: b.scl.to_string(),
            spi_mosi: b.mosi.to_string(),
            spi_miso: b.miso.to_string(),
            spi_sck: b.sck.to_string(),
            spi_cs: b.cs.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin<'a>(guide: &'a ConnectionGuideResult, module_pin: &str) -> &'a str {
        guide
            .connections
            .iter()
            .find(|c| c.module_pin == module_pin)
            .map(|c| c.board_pin.as_str())
            .unwrap()
    }

    #[test]
    fn test_bme280_on_esp32dev() {
        let guide = connection_guide("esp32dev", "BME280");
        assert!(guide.known);
        assert_eq!(guide.bus.as_deref(), Some("i2c"));
        assert_eq!(pin(&guide, "SDA"), "GPIO21");
        assert_eq!(pin(&guide, "SCL"), "GPIO22");
        assert_eq!(pin(&guide, "VCC"), "3V3");
        assert!(guide.notes.iter().any(|n| n.contains("0x76")));
    }

    #[test]
    fn test_xiao_c3_uses_board_pins() {
        let guide = connection_guide("seeed_xiao_esp32c3", "BME280");
        assert_eq!(guide.chip.as_deref(), Some("ESP32-C3"));
        assert_eq!(pin(&guide, "SDA"), "D4 (GPIO6)");
    }

    #[test]
    fn test_module_matching_is_loose() {
        assert_eq!(find_module("OLED SSD1306").unwrap().name, "SSD1306");
        assert_eq!(find_module("hc_sr04").unwrap().name, "HC-SR04");
        assert_eq!(find_module("WS2812B strip").unwrap().name, "WS2812");
        assert_eq!(find_module("micro SD card module").unwrap().name, "SD card");
        assert_eq!(find_module("NeoPixel ring").unwrap().name, "WS2812");
        assert!(find_module("").is_none());
        assert!(find_module("LoRa SX1276").is_none());
    }

    #[test]
    fn test_board_family_fallback() {
        assert_eq!(find_board("esp32-s3-box").unwrap().chip, "ESP32-S3");
        assert_eq!(find_board("lolin_esp32c3_mini").unwrap().chip, "ESP32-C3");
        assert_eq!(find_board("esp32-c3-devkitc-02").unwrap().board_id, "esp32-c3-devkitm-1");
        assert_eq!(find_board("esp32doit-devkit-v1").unwrap().board_id, "esp32dev");
        assert!(find_board("uno").is_none());
    }

    #[test]
    fn test_other_chip_families_do_not_fall_back() {
        assert!(find_board("esp32-s2-saola-1").is_none());
        assert!(find_board("esp32-h2-devkitm-1").is_none());
        assert!(find_board("esp32-p4-function-ev-board").is_none());
        assert!(find_board("esp32-c61-devkitc1").is_none());

        let guide = connection_guide("esp32-s2-saola-1", "BME280");
        assert!(!guide.known);
        assert!(guide.chip.is_none());
        assert!(guide.connections.is_empty());
        assert!(guide.hint.is_some());
    }

    #[test]
    fn test_fallback_adds_note() {
        let guide = connection_guide("esp32doit-devkit-v1", "DHT22");
        assert!(guide.known);
        assert!(guide.notes[0].contains("esp32dev"));
        assert_eq!(pin(&guide, "DATA"), "GPIO4");
    }

    #[test]
    fn test_spi_module() {
        let guide = connection_guide("esp32-s3-devkitc-1", "MAX7219");
        assert_eq!(guide.bus.as_deref(), Some("spi"));
        assert_eq!(pin(&guide, "MOSI/DIN"), "GPIO11");
        assert_eq!(pin(&guide, "CS"), "GPIO10");
    }

    #[test]
    fn test_ultrasonic_uses_two_gpios() {
        let guide = connection_guide("esp32dev", "HC-SR04");
        assert_eq!(pin(&guide, "TRIG"), "GPIO4");
        assert_eq!(pin(&guide, "ECHO"), "GPIO16");
        assert_eq!(pin(&guide, "VCC"), "5V");
    }

    #[test]
    fn test_unknown_combination_returns_hint() {
        let guide = connection_guide("uno", "BME280");
        assert!(!guide.known);
        assert!(guide.connections.is_empty());
        assert!(guide.hint.is_some());

        let guide = connection_guide("esp32dev", "mystery sensor");
        assert!(!guide.known);
        assert_eq!(guide.chip.as_deref(), Some("ESP32"));
    }

    #[test]
    fn test_board_infos_cover_table() {
        let boards = board_infos();
        assert_eq!(boards.len(), BOARDS.len());
        assert!(boards.iter().any(|b| b.board_id == "seeed_xiao_esp32c3"));
    }
}
