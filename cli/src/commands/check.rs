use anyhow::Result;
use fieldmap::ViewerConfig;

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::CheckArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    match &args.config {
        Some(path) => println!("[check] {} is valid", path.display()),
        None => println!("[check] built-in config is valid"),
    }

    for country in config.country_names() {
        println!("{}", describe(&config, country));
        if cli.verbose > 0 {
            for url in config.tile_sources(country).into_iter().chain(config.landcover(country)).flat_map(|s| s.urls()) {
                println!("    {url}");
            }
        }
    }
    if let Some(country) = &config.default_country {
        let year = config.default_year_for(country).unwrap_or("-");
        println!("[check] default: {country} {year}");
    }
    Ok(())
}

/// One summary line per country.
fn describe(config: &ViewerConfig, country: &str) -> String {
    let tiles = match config.tile_sources(country) {
        None => "no field boundaries".to_string(),
        Some(sources) if sources.is_single() => "field boundaries (single archive)".to_string(),
        Some(sources) => {
            let years = sources.years();
            format!("field boundaries {}", years.join(","))
        }
    };
    let landcover = match config.landcover(country) {
        None => "no landcover".to_string(),
        Some(sources) if sources.is_single() => "landcover".to_string(),
        Some(sources) => format!("landcover {}", sources.years().join(",")),
    };
    let view = if config.view(country).is_some() { "" } else { ", no camera preset" };
    format!("  {country}: {tiles}; {landcover}{view}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_builtin_countries() {
        let config = ViewerConfig::builtin().unwrap();
        assert_eq!(describe(&config, "Tanzania"), "  Tanzania: no field boundaries; landcover");
        assert!(describe(&config, "Zambia").starts_with("  Zambia: field boundaries 2018,2019,2020,2021,2022,2023;"));
        assert!(describe(&config, "Congo").contains("single archive"));
    }
}
