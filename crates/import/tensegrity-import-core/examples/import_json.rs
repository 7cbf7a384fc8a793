//! Import a tensegrity JSON file and print the report plus the first few events.
//!
//! ```text
//! cargo run -p tensegrity-import-core --example import_json -- path/to/structure.json [--construction] [--frame N]
//! ```

use anyhow::{bail, Context, Result};
use tensegrity_import_core::{apply_events, ImportConfig, Importer, ImportProgress, KeyframeScene};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tensegrity_import_core=info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: import_json <file.json> [--construction] [--frame N]");
    };
    let mut config = ImportConfig::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--construction" => config.construction_mode = true,
            "--frame" => {
                let index: usize = args
                    .next()
                    .context("--frame needs an index")?
                    .parse()
                    .context("--frame index must be a number")?;
                config = ImportConfig {
                    construction_mode: config.construction_mode,
                    ..ImportConfig::single_frame(index)
                };
            }
            other => bail!("unknown argument '{other}'"),
        }
    }

    let json = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let mut on_progress = |p: ImportProgress| {
        eprintln!(
            "  frame {}/{} ({} events)",
            p.frames_done, p.frame_count, p.events_emitted
        );
    };
    let outcome = Importer::new(config)
        .with_progress(&mut on_progress)
        .import_str(&json)?;

    let mut scene = KeyframeScene::new();
    apply_events(&mut scene, &outcome.events)?;

    println!("{}", outcome.report);
    println!(
        "timeline {}..={}, {} keyframe events, {} scene objects",
        outcome.report.frame_start,
        outcome.report.frame_end,
        outcome.report.keyframe_events,
        scene.objects().len()
    );
    for event in outcome.events.iter().take(8) {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}
