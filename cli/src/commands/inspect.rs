use anyhow::Result;
use fieldmap::{archive::ArchiveHeader, resolver::source_layer_from_metadata, FileArchive, HttpArchive, MetadataFetcher};

fn is_remote(target: &str) -> bool {
    target.starts_with("https://") || target.starts_with("http://")
}

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::InspectArgs) -> Result<()> {
    let target = args.archive.as_str();
    let (header, metadata) = if is_remote(target) {
        let archive = HttpArchive::new()?;
        (archive.header(target)?, archive.fetch_metadata(target)?)
    } else {
        let archive = FileArchive::new(".");
        (archive.header(target)?, archive.fetch_metadata(target)?)
    };

    print_header(target, &header);
    println!("source layer: {}", source_layer_from_metadata(Some(&metadata)));
    if cli.verbose > 0 {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
    }
    Ok(())
}

fn print_header(target: &str, header: &ArchiveHeader) {
    let [west, south, east, north] = header.bounds;
    println!("[inspect] {target}");
    println!("tile type: {:?} ({:?} tiles, {:?} directories)", header.tile_type, header.tile_compression, header.internal_compression);
    println!("zoom: {}-{}", header.min_zoom, header.max_zoom);
    println!("bounds: {west:.4},{south:.4},{east:.4},{north:.4}");
    println!("center: {:.4},{:.4} z{}", header.center[0], header.center[1], header.center_zoom);
    println!("tiles: {} addressed, {} entries, {} contents", header.addressed_tiles, header.tile_entries, header.tile_contents);
}
