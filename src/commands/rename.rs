use anyhow::Result;
use owo_colors::OwoColorize;

pub async fn run(property: &str, name: &str) -> Result<()> {
    let (_, aggregator) = super::load()?;
    let property = property.trim();

    if !aggregator.feeds().iter().any(|f| f.property_key == property) {
        eprintln!("{}", format!("No feed registered for {property} yet").yellow());
    }

    aggregator.set_display_name(property, name).await?;

    let names = aggregator.names();
    let display_name = names.get(property).map(String::as_str).unwrap_or(name);
    println!("{} {} → {}", "✓".green(), property, display_name.bold());

    Ok(())
}
