//! Size-capped log file with numbered generations.
//!
//! `shellctl.log` is the live file. When a write would push it past the size
//! cap it becomes `shellctl.1.log`, older generations shift up by one, and
//! anything beyond `keep` generations is deleted.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing_subscriber::fmt::MakeWriter;

struct LiveFile {
    file: File,
    len: u64,
}

pub struct RotatingFile {
    dir: PathBuf,
    stem: String,
    keep: usize,
    cap: u64,
    live: Mutex<LiveFile>,
}

impl RotatingFile {
    /// Open (or continue) `<dir>/<stem>.log`. `keep` counts rotated
    /// generations in addition to the live file.
    pub fn open(dir: &Path, stem: &str, keep: usize, cap: u64) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let stem = file_stem(stem);
        let live = open_live(&dir.join(format!("{stem}.log")))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            stem,
            keep,
            cap,
            live: Mutex::new(live),
        })
    }

    pub fn live_path(&self) -> PathBuf {
        self.generation_path(0)
    }

    fn generation_path(&self, generation: usize) -> PathBuf {
        if generation == 0 {
            self.dir.join(format!("{}.log", self.stem))
        } else {
            self.dir.join(format!("{}.{}.log", self.stem, generation))
        }
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, LiveFile>> {
        self.live
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))
    }

    /// Shift every generation up by one and start an empty live file.
    fn rotate(&self, live: &mut LiveFile) -> io::Result<()> {
        live.file.flush()?;

        // With keep == 0 the oldest generation is the live file itself.
        remove_if_present(&self.generation_path(self.keep))?;
        for generation in (0..self.keep).rev() {
            let from = self.generation_path(generation);
            if from.exists() {
                fs::rename(&from, self.generation_path(generation + 1))?;
            }
        }

        *live = open_live(&self.live_path())?;
        Ok(())
    }

    fn write_record(&self, buf: &[u8]) -> io::Result<usize> {
        let mut live = self.lock()?;
        if live.len > 0 && live.len + buf.len() as u64 > self.cap {
            self.rotate(&mut live)?;
        }
        live.file.write_all(buf)?;
        live.len += buf.len() as u64;
        Ok(buf.len())
    }
}

fn open_live(path: &Path) -> io::Result<LiveFile> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let len = file.metadata()?.len();
    Ok(LiveFile { file, len })
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Keep file names portable whatever the binary calls itself.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    if stem.is_empty() {
        "shellctl".to_string()
    } else {
        stem
    }
}

/// One formatted event's worth of writes.
pub struct RecordWriter<'a> {
    target: &'a RotatingFile,
}

impl Write for RecordWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.target.write_record(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.target.lock()?.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFile {
    type Writer = RecordWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RecordWriter { target: self }
    }
}
