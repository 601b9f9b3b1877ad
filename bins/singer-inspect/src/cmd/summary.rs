use std::io::Write;

use singer_api::MessageType;
use singer_testing::{ClassifySummary, MessageBuckets};

use crate::config::SummaryArgs;
use crate::error::InspectError;

pub fn run(args: SummaryArgs) -> Result<(), InspectError> {
    let (buckets, summary) = super::load(&args.file)?;
    let stdout = std::io::stdout();
    render(&mut stdout.lock(), &buckets, &summary)?;

    if summary.unknown > 0 {
        tracing::warn!(count = summary.unknown, "unknown message types in capture");
        if args.strict {
            return Err(InspectError::UnknownTypes(summary.unknown));
        }
    }
    Ok(())
}

pub(crate) fn render(
    out: &mut impl Write,
    buckets: &MessageBuckets,
    summary: &ClassifySummary,
) -> Result<(), InspectError> {
    writeln!(out, "messages: {}", summary.total())?;
    for (kind, count) in [
        (MessageType::Schema.as_str(), summary.schema),
        (MessageType::Record.as_str(), summary.record),
        (MessageType::State.as_str(), summary.state),
        (MessageType::ActivateVersion.as_str(), summary.activate_version),
        ("unknown", summary.unknown),
    ] {
        writeln!(out, "  {kind:<18}{count}")?;
    }
    writeln!(out, "streams: {}", buckets.streams().len())?;
    for (stream, records) in buckets.all_records() {
        writeln!(out, "  {stream:<18}{}", records.len())?;
    }
    Ok(())
}
