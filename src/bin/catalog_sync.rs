use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    catalog_sync::app::run_sync_cli(std::env::args().skip(1))?;
    Ok(())
}
