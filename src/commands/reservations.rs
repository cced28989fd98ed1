use anyhow::Result;
use staygrid_core::TimelineEntry;

pub async fn run() -> Result<()> {
    let (_, aggregator) = super::load()?;
    super::refresh(&aggregator).await?;

    let snapshot = aggregator.timelines();
    let entries: Vec<TimelineEntry> = snapshot
        .iter()
        .flat_map(|timeline| timeline.entries())
        .collect();
    println!("{}", serde_json::to_string_pretty(&entries)?);

    Ok(())
}
