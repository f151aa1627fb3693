use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::Local;

use crate::{record::Record, sink::Sink, template::Template};

struct FileState {
    path: PathBuf,
    file: Option<BufWriter<File>>,
}

/// Appends rendered records to a file.
///
/// The file is opened on the first write and every record is flushed right
/// away, so nothing is lost when a fatal record aborts the process. A file
/// that cannot be opened is reported on stderr and the record is dropped.
pub struct FileSink {
    template: Template,
    state: Mutex<FileState>,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            template: Template::default(),
            state: Mutex::new(FileState {
                path: path.as_ref().to_path_buf(),
                file: None,
            }),
        }
    }

    /// Creates a sink writing to `<directory>/<prefix><timestamp>.log`.
    ///
    /// Older files matching `<prefix>*.log` are deleted so that, once the new
    /// file exists, at most `max_files` of them remain.
    pub fn rotating<P: AsRef<Path>>(
        prefix: &str,
        directory: P,
        max_files: u32,
    ) -> Result<Self, io::Error> {
        if max_files < 1 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "max_files must be at least 1",
            ));
        }
        let directory = directory.as_ref();
        fs::create_dir_all(directory)?;
        cleanup(directory, prefix, max_files as usize - 1)?;
        let timestamp = Local::now().format("%Y-%m-%d_%H.%M.%S");
        Ok(Self::new(directory.join(format!("{prefix}{timestamp}.log"))))
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn path(&self) -> PathBuf {
        self.lock().path.clone()
    }

    /// Closes the current file; the next record opens `path`.
    pub fn set_path<P: AsRef<Path>>(&self, path: P) {
        let mut state = self.lock();
        if let Some(mut file) = state.file.take() {
            let _ = file.flush();
        }
        state.path = path.as_ref().to_path_buf();
    }

    fn lock(&self) -> MutexGuard<'_, FileState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Sink for FileSink {
    fn write(&self, record: &Record<'_>) {
        let line = self.template.render(record);
        let mut state = self.lock();
        let FileState { path, file } = &mut *state;
        if file.is_none() {
            match open_append(path) {
                Ok(opened) => *file = Some(opened),
                Err(err) => {
                    eprintln!("catlog: cannot open the log file {}: {err}", path.display());
                    return;
                }
            }
        }
        if let Some(file) = file.as_mut()
            && let Err(err) = file
                .write_all(line.as_bytes())
                .and_then(|()| file.flush())
        {
            eprintln!("catlog: cannot write to the log file {}: {err}", path.display());
        }
    }

    fn flush(&self) {
        if let Some(file) = self.lock().file.as_mut() {
            let _ = file.flush();
        }
    }
}

fn open_append(path: &Path) -> Result<BufWriter<File>, io::Error> {
    let file = File::options().create(true).append(true).open(path)?;
    Ok(BufWriter::new(file))
}

/// Keeps the `keep` newest `<prefix>*.log` files of `directory`.
fn cleanup(directory: &Path, prefix: &str, keep: usize) -> Result<(), io::Error> {
    let mut matching_files: Vec<PathBuf> = fs::read_dir(directory)?
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(prefix) && name.ends_with(".log") {
                Some(entry.path())
            } else {
                None
            }
        })
        .collect();
    // timestamped names sort chronologically
    matching_files.sort();
    let excess = matching_files.len().saturating_sub(keep);
    for oldest in &matching_files[..excess] {
        let _ = fs::remove_file(oldest);
    }
    Ok(())
}
