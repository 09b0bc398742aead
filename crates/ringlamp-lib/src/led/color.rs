//! Color and brightness parsing, formatting and hue conversions.
//!
//! Colors are `0xRRGGBB` internally and `#RRGGBB` on the wire.

/// Parse a color string into `0xRRGGBB`.
///
/// Accepts:
/// - Hex: `"#FF0000"`, `"FF0000"`, `"#ff0000"`
/// - Named: `"red"`, `"green"`, `"blue"`, `"white"`, `"orange"`, `"yellow"`, `"purple"`, `"cyan"`
pub fn parse_color(s: &str) -> crate::error::Result<u32> {
    let s = s.trim();

    match s.to_lowercase().as_str() {
        "red" => return Ok(0xFF_0000),
        "green" => return Ok(0x00_FF00),
        "blue" => return Ok(0x00_00FF),
        "white" => return Ok(0xFF_FFFF),
        "orange" => return Ok(0xFF_8000),
        "yellow" => return Ok(0xFF_FF00),
        "purple" => return Ok(0x80_00FF),
        "cyan" => return Ok(0x00_FFFF),
        "off" | "black" => return Ok(0x00_0000),
        _ => {}
    }

    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 {
        return Err(crate::RinglampError::Color(format!(
            "Invalid color: {s} (use #RRGGBB or a color name)"
        )));
    }
    u32::from_str_radix(hex, 16)
        .map_err(|_| crate::RinglampError::Color(format!("Invalid hex color: {s}")))
}

/// Format `0xRRGGBB` as `#RRGGBB`.
pub fn format_color(val: u32) -> String {
    let r = (val >> 16) & 0xFF;
    let g = (val >> 8) & 0xFF;
    let b = val & 0xFF;
    format!("#{r:02X}{g:02X}{b:02X}")
}

/// Normalize any accepted color spelling to the wire form `#RRGGBB`.
pub fn normalize_color(s: &str) -> crate::error::Result<String> {
    parse_color(s).map(format_color)
}

/// Parse a decimal brightness string (`0`-`255`).
pub fn parse_brightness(s: &str) -> crate::error::Result<u8> {
    s.trim().parse::<u8>().map_err(|_| {
        crate::RinglampError::Color(format!("Invalid brightness: {s} (use 0-255)"))
    })
}

fn hex_channel(x: f64) -> String {
    format!("{:02x}", (x * 255.0).round().clamp(0.0, 255.0) as u8)
}

/// HSL to lowercase `#rrggbb`. `h` in degrees, `s` and `l` in percent.
pub fn hsl_to_hex(h: f64, s: f64, l: f64) -> String {
    let s = s / 100.0;
    let l = l / 100.0;
    let a = s * l.min(1.0 - l);
    let f = |n: f64| {
        let k = (n + h / 30.0) % 12.0;
        l - a * (k - 3.0).min(9.0 - k).min(1.0).max(-1.0)
    };
    format!("#{}{}{}", hex_channel(f(0.0)), hex_channel(f(8.0)), hex_channel(f(4.0)))
}

/// HSV to lowercase `#rrggbb`. All components in `0.0..=1.0`.
pub fn hsv_to_hex(h: f64, s: f64, v: f64) -> String {
    let i = (h * 6.0).floor();
    let f = h * 6.0 - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    let (r, g, b) = match (i as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    format!("#{}{}{}", hex_channel(r), hex_channel(g), hex_channel(b))
}
