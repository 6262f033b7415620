//! `cover render`: flags to scene to PNG.

use std::path::PathBuf;

use anyhow::Context;
use cover_core::{export_snapshot, BackgroundPatch, IconPatch, IconSource, SceneStore, TextPatch};
use cover_renderer::image::to_data_uri;
use cover_renderer::{probe_dimensions, SvgSnapshotRenderer};
use tracing::{debug, info};

use crate::RenderArgs;

/// Build the scene described by `args`.
///
/// # Errors
///
/// Returns an error if a referenced file cannot be read or probed.
pub fn build_scene(args: &RenderArgs) -> anyhow::Result<SceneStore> {
    let mut store = SceneStore::new();

    if !args.ratios.is_empty() {
        for ratio in &args.ratios {
            if !store.active_ratios().contains(ratio) {
                store.toggle_ratio(*ratio);
            }
        }
        let unwanted: Vec<_> = store
            .active_ratios()
            .iter()
            .copied()
            .filter(|r| !args.ratios.contains(r))
            .collect();
        for ratio in unwanted {
            store.toggle_ratio(ratio);
        }
    }

    let title = store.texts()[0].id;
    if args.title.is_some() || args.split {
        store.update_text(
            title,
            TextPatch {
                content: args.title.clone(),
                is_split: args.split.then_some(true),
                ..TextPatch::default()
            },
        );
    }

    if let Some(icon) = &args.icon {
        // Iconify names are `set:name`; anything else is a file.
        let source = if icon.contains(':') {
            IconSource::Named(icon.clone())
        } else {
            let bytes = std::fs::read(icon).with_context(|| format!("reading icon {icon}"))?;
            IconSource::Custom(to_data_uri(&bytes))
        };
        let id = store.icons()[0].id;
        store.update_icon(
            id,
            IconPatch {
                source: Some(source),
                ..IconPatch::default()
            },
        );
    }

    if let Some(color) = &args.background_color {
        store.update_background(BackgroundPatch::solid(color.clone()));
    }

    if let Some(path) = &args.background_image {
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading background {}", path.display()))?;
        let uri = to_data_uri(&bytes);
        let size = probe_dimensions(&uri)
            .with_context(|| format!("probing background {}", path.display()))?;
        debug!(width = size.width, height = size.height, "Background image probed");
        store.update_background(BackgroundPatch::image(uri));
        if let Some(fit) = args.fit {
            store.fit_background(fit.into(), Some(size));
        }
    }

    if args.no_ruler {
        store.set_show_ruler(false);
    }

    Ok(store)
}

/// Build the scene, export it and write the PNG to `args.out`.
///
/// # Errors
///
/// Returns an error if the scene cannot be built, rendered or written.
pub fn render_cover(args: &RenderArgs) -> anyhow::Result<PathBuf> {
    let mut store = build_scene(args)?;
    let renderer = SvgSnapshotRenderer::new();
    let snapshot = export_snapshot(&mut store, &renderer)?;

    std::fs::write(&args.out, &snapshot.bytes)
        .with_context(|| format!("writing {}", args.out.display()))?;
    info!(path = %args.out.display(), bytes = snapshot.bytes.len(), "Cover written");
    Ok(args.out.clone())
}
