use std::fs;

use fitting::{FittingError, FittingResult, ImageSource, Stage};

use crate::cli::{GlobalOptions, RenderCommand};

use super::utils::{
    build_room, load_product, photo_stem_and_dir, select_variant, slugify, stage_progress_bar,
};

/// The main function to run the render command.
pub fn run(global: &GlobalOptions, cmd: RenderCommand) -> FittingResult<()> {
    let room = build_room(global);
    let mut product = load_product(&cmd.product)?;
    if let Some(selector) = &cmd.variant {
        product = select_variant(&product, selector)?;
    }

    let photo = ImageSource::parse(&cmd.photo);
    let (stem, default_dir) = photo_stem_and_dir(&photo);
    let output_dir = cmd.output_dir.clone().unwrap_or(default_dir);
    fs::create_dir_all(&output_dir)?;

    let pb = stage_progress_bar();
    let results = room.try_on_each(&photo, &product, &mut |label: &str, stage: Stage| {
        pb.set_message(format!("{label}: {}", stage.describe()));
        pb.set_position(u64::from(stage.percent()));
    });
    pb.finish_and_clear();

    let mut saved = 0usize;
    let mut first_error: Option<FittingError> = None;
    for result in results {
        match result.outcome {
            Ok(render) => {
                let path = output_dir.join(format!("{stem}-{}.png", slugify(&result.label)));
                render.image.save(&path)?;
                println!(
                    "{} saved to {} (face detected: {}, anchor: {})",
                    result.label,
                    path.display(),
                    render.face_detected,
                    render.placement.anchor.as_str()
                );
                saved += 1;
            }
            Err(err) => {
                eprintln!("{}: try-on failed: {err}", result.label);
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        Some(err) if saved == 0 => Err(err),
        _ => Ok(()),
    }
}
