//! Rotating on-disk frame store for field verification.
//!
//! Saves normalized ML-resolution frames into a fixed set of N slots
//! (`night_<slot>.pgm`), reused in cyclic order. Storage use is bounded
//! regardless of run duration, which is a hard requirement on a device
//! with finite flash.
//!
//! The slot counter advances once per *save* call, not per accepted
//! frame; save frequency is governed entirely by the caller's sampling
//! policy.
//!
//! Files are minimal binary PGM: a `P5\n<w> <h>\n255\n` header followed
//! by `w * h` raw bytes, row-major. Save failures are recoverable; the
//! caller logs and moves on.

use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use crate::plane::LumaPlane;

/// Default number of rotating slots.
pub const DEFAULT_RING_SLOTS: usize = 50;

/// Bounded rotating set of persisted frame files.
pub struct FrameRing {
    dir: PathBuf,
    slots: usize,
    next_slot: usize,
    saves: u64,
}

impl FrameRing {
    /// Open a ring over `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>, slots: usize) -> Result<Self> {
        let dir = dir.into();
        if slots == 0 {
            return Err(anyhow!("frame ring needs at least one slot"));
        }
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create ring directory {}", dir.display()))?;
        Ok(Self {
            dir,
            slots,
            next_slot: 0,
            saves: 0,
        })
    }

    /// Path of a slot file.
    pub fn slot_path(&self, slot: usize) -> PathBuf {
        self.dir.join(format!("night_{}.pgm", slot))
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Total saves performed over the ring's lifetime.
    pub fn saves(&self) -> u64 {
        self.saves
    }

    /// Save `plane` into the current slot and advance the rotation.
    ///
    /// Deletes any file already occupying the slot first (idempotent when
    /// absent), so a failed rewrite never leaves a stale frame behind.
    /// Returns the path written.
    pub fn save(&mut self, plane: &LumaPlane) -> Result<PathBuf> {
        let path = self.slot_path(self.next_slot);
        self.next_slot = (self.next_slot + 1) % self.slots;

        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("remove stale slot {}", path.display()))
            }
        }

        write_pgm(&path, plane)?;
        self.saves += 1;
        Ok(path)
    }
}

fn write_pgm(path: &Path, plane: &LumaPlane) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("open slot file {}", path.display()))?;
    write!(file, "P5\n{} {}\n255\n", plane.width, plane.height)
        .with_context(|| format!("write pgm header to {}", path.display()))?;
    file.write_all(plane.as_slice())
        .with_context(|| format!("write pgm pixels to {}", path.display()))?;
    Ok(())
}

/// Read a slot file back into a plane. Used by `ring_inspect` and tests.
pub fn read_pgm(path: &Path) -> Result<LumaPlane> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let magic = read_header_token(&mut reader)?;
    if magic != "P5" {
        return Err(anyhow!("{}: not a binary pgm (magic {})", path.display(), magic));
    }
    let width: usize = read_header_token(&mut reader)?
        .parse()
        .with_context(|| format!("{}: bad width", path.display()))?;
    let height: usize = read_header_token(&mut reader)?
        .parse()
        .with_context(|| format!("{}: bad height", path.display()))?;
    let maxval: usize = read_header_token(&mut reader)?
        .parse()
        .with_context(|| format!("{}: bad maxval", path.display()))?;
    if maxval != 255 {
        return Err(anyhow!("{}: unsupported maxval {}", path.display(), maxval));
    }

    let mut plane = LumaPlane::new(width, height);
    reader
        .read_exact(plane.as_mut_slice())
        .with_context(|| format!("{}: truncated pixel data", path.display()))?;
    Ok(plane)
}

fn read_header_token(reader: &mut impl BufRead) -> Result<String> {
    let mut token = String::new();
    let mut byte = [0u8; 1];
    loop {
        reader.read_exact(&mut byte).context("pgm header truncated")?;
        let c = byte[0] as char;
        if c.is_ascii_whitespace() {
            if token.is_empty() {
                continue;
            }
            return Ok(token);
        }
        token.push(c);
    }
}
