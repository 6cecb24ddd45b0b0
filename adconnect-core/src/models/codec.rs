//! CSV codec for report frames.

use std::io::{Read, Write};

use super::frame::ReportFrame;
use super::value::Value;
use crate::error::CoreError;

impl ReportFrame {
    /// Reads a frame from delimited text with a header row.
    ///
    /// Records are allowed to be ragged: short records are padded with
    /// [`Value::Null`] and extra fields are dropped. Field types are inferred
    /// with [`Value::parse`], which keeps any field whose number would print
    /// differently as text.
    pub fn from_csv_reader<R: Read>(reader: R, delimiter: u8) -> Result<ReportFrame, CoreError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();
        let width = headers.len();
        let mut frame = ReportFrame::with_columns(headers);

        for record in rdr.records() {
            let record = record?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            let mut values: Vec<Value> = record.iter().take(width).map(Value::parse).collect();
            values.resize(width, Value::Null);
            frame.push_values(values)?;
        }

        Ok(frame)
    }

    /// Reads a comma-separated frame from a string.
    pub fn from_csv_str(text: &str) -> Result<ReportFrame, CoreError> {
        Self::from_csv_reader(text.as_bytes(), b',')
    }

    /// Writes the frame as delimited text.
    ///
    /// The header row is skipped when `header` is false, which lets callers
    /// append to an existing file.
    pub fn write_csv<W: Write>(&self, writer: W, delimiter: u8, header: bool) -> Result<(), CoreError> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);

        if header {
            wtr.write_record(self.columns())?;
        }
        for row in self.rows() {
            wtr.write_record(row.values().iter().map(ToString::to_string))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Renders the frame as a CSV string.
    pub fn to_csv_string(&self) -> Result<String, CoreError> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf, b',', true)?;
        String::from_utf8(buf).map_err(|e| CoreError::InvalidData(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_ragged_csv() {
        let text = "Date,Clicks,Impressions\n2022/01/01,3,100\n2022/01/02,4\n\nTotal,7,100,extra\n";
        let frame = ReportFrame::from_csv_str(text).unwrap();

        assert_eq!(frame.columns(), &["Date", "Clicks", "Impressions"]);
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.get(1, "Impressions"), Some(&Value::Null));
        assert_eq!(frame.get(2, "Clicks"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_downloaded_cells_are_written_back_verbatim() {
        let text = "Campaign,Insertion Order ID,Spend\n1E3,123456789012345678901,1.50\n3.10,7,2.0\n";
        let frame = ReportFrame::from_csv_str(text).unwrap();

        assert_eq!(frame.get(0, "Campaign"), Some(&Value::from("1E3")));
        assert_eq!(frame.get(1, "Insertion Order ID"), Some(&Value::Int(7)));
        assert_eq!(frame.to_csv_string().unwrap(), text);
    }

    #[test]
    fn test_strips_byte_order_mark() {
        let frame = ReportFrame::from_csv_str("\u{feff}Date,Clicks\n2022-01-01,1\n").unwrap();
        assert_eq!(frame.columns()[0], "Date");
    }

    #[test]
    fn test_writes_header_then_rows() {
        let mut frame = ReportFrame::new();
        frame.push_row([("date", Value::from("2022-01-01")), ("spend", Value::Float(1.5))]);
        frame.push_row([("date", Value::from("2022-01-02"))]);

        let out = frame.to_csv_string().unwrap();
        assert_eq!(out, "date,spend\n2022-01-01,1.5\n2022-01-02,\n");
    }

    #[test]
    fn test_write_without_header_and_tabs() {
        let mut frame = ReportFrame::new();
        frame.push_row([("a", Value::Int(1)), ("b", Value::from("x y"))]);

        let mut buf = Vec::new();
        frame.write_csv(&mut buf, b'\t', false).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "1\tx y\n");
    }
}
