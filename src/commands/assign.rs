use anyhow::Result;
use owo_colors::OwoColorize;
use staygrid_core::CleaningOffset;
use staygrid_core::grid::vendor_glyph;

pub async fn run(property: &str, vendor: &str, offset: Option<&str>) -> Result<()> {
    let offset = match offset {
        Some(raw) => CleaningOffset::parse(raw)?,
        None => CleaningOffset::zero(),
    };

    let (_, aggregator) = super::load()?;
    aggregator.set_vendor(property, vendor, offset).await?;

    let vendor = vendor.trim();
    println!(
        "{} {} cleaned by {} {} {}",
        "✓".green(),
        property.trim(),
        vendor_glyph(vendor),
        vendor.bold(),
        format!("(+{offset} after checkout)").dimmed()
    );

    Ok(())
}
