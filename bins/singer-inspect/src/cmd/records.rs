use std::io::Write;

use crate::config::RecordsArgs;
use crate::error::InspectError;

pub fn run(args: RecordsArgs) -> Result<(), InspectError> {
    let (buckets, _) = super::load(&args.file)?;
    let records = buckets.records(&args.stream);
    if records.is_empty() {
        return Err(InspectError::NoRecords(args.stream));
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
