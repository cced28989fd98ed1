use anyhow::Result;
use chrono::NaiveDate;
use staygrid_core::{DateWindow, OccupancyPolicy, project};

use crate::render::Render;

pub async fn run(
    start: Option<NaiveDate>,
    days: Option<u32>,
    page: i64,
    exclusive_checkout: bool,
) -> Result<()> {
    let window = DateWindow::resolve(start, days, page)?;
    let (config, aggregator) = super::load()?;
    super::refresh(&aggregator).await?;

    let policy = if exclusive_checkout {
        OccupancyPolicy::ExclusiveCheckout
    } else {
        config.occupancy_policy
    };

    let snapshot = aggregator.timelines();
    let grid = project(snapshot.iter(), window, policy);
    println!("{}", grid.render());

    Ok(())
}
