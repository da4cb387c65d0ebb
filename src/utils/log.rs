use chrono::Local;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Logs a message to a file with timestamp
///
/// # Arguments
///
/// * `log_dir` - Directory holding the log files (created if missing)
/// * `filename` - The name of the log file inside `log_dir`
/// * `message` - The message to log
pub fn log_to_file(log_dir: &Path, filename: &str, message: &str) -> io::Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(filename))?;

    let timestamp = Local::now().to_rfc3339();

    writeln!(file, "\n--- Log entry at {} ---", timestamp)?;
    writeln!(file, "{}", message)?;
    writeln!(file, "--- End of entry ---\n")?;

    file.flush()
}

/// Logs a message to a file with a formatted header
pub fn log_with_header(log_dir: &Path, filename: &str, header: &str, message: &str) -> io::Result<()> {
    let formatted_message = format!(
        "===== {} =====\n{}\n====================",
        header, message
    );
    log_to_file(log_dir, filename, &formatted_message)
}

/// Appends a row to a CSV file, writing `headers` first when the file is new.
/// The first column is always the entry's timestamp.
pub fn log_csv(log_dir: &Path, filename: &str, headers: &[&str], data: &[&str]) -> io::Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let path = log_dir.join(filename);
    let file_exists = path.exists();

    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let mut writer = csv::Writer::from_writer(file);

    if !file_exists && !headers.is_empty() {
        let mut header_row = vec!["timestamp"];
        header_row.extend_from_slice(headers);
        writer.write_record(&header_row)?;
    }

    let timestamp = Local::now().to_rfc3339();
    let mut row = vec![timestamp.as_str()];
    row.extend_from_slice(data);
    writer.write_record(&row)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_header_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");

        log_csv(&logs, "blocks.csv", &["block", "epochs"], &["1", "8"]).unwrap();
        log_csv(&logs, "blocks.csv", &["block", "epochs"], &["2", "8"]).unwrap();

        let mut reader = csv::Reader::from_path(logs.join("blocks.csv")).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["timestamp", "block", "epochs"]);

        let blocks: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[1].to_string())
            .collect();
        assert_eq!(blocks, vec!["1", "2"]);
    }

    #[test]
    fn entries_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        log_with_header(dir.path(), "run.log", "start", "first").unwrap();
        log_to_file(dir.path(), "run.log", "second").unwrap();

        let text = std::fs::read_to_string(dir.path().join("run.log")).unwrap();
        assert!(text.contains("===== start ====="));
        assert!(text.find("first").unwrap() < text.find("second").unwrap());
    }
}
