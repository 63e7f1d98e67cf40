//! Textual hex dump of the ML-resolution plane.
//!
//! A debugging aid for verifying boosted frames over a serial console or
//! captured log, not a stable contract: two hex digits per pixel, one
//! line per row, bracketed by `IMAGE_START` / `IMAGE_END` markers.

use anyhow::Result;
use std::io::Write;

use crate::plane::LumaPlane;

pub const DUMP_START_MARKER: &str = "IMAGE_START";
pub const DUMP_END_MARKER: &str = "IMAGE_END";

/// Write the plane as marker-bracketed hex rows.
pub fn hex_dump(plane: &LumaPlane, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", DUMP_START_MARKER)?;
    for row in plane.as_slice().chunks(plane.width) {
        writeln!(out, "{}", hex::encode(row))?;
    }
    writeln!(out, "{}", DUMP_END_MARKER)?;
    Ok(())
}
