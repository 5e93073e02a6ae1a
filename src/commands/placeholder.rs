use std::path::PathBuf;

use fitting::FittingResult;
use fitting::placeholder::{PlaceholderStyle, render_placeholder};

use crate::cli::{GlobalOptions, PlaceholderCommand};

use super::utils::{build_room, load_product, select_variant, slugify};

/// The main function to run the placeholder command.
pub fn run(global: &GlobalOptions, cmd: PlaceholderCommand) -> FittingResult<()> {
    let room = build_room(global);
    let mut product = load_product(&cmd.product)?;
    if let Some(selector) = &cmd.variant {
        let narrowed = select_variant(&product, selector)?;
        if let Some(variant) = narrowed.variants.first() {
            product = product.with_variant(variant);
        }
    }

    let output_path = cmd
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}-placeholder.png", slugify(&product.id))));
    let image = render_placeholder(
        &PlaceholderStyle::from(&product),
        room.loader().settings().placeholder_size,
    );
    image.save(&output_path)?;
    println!("Placeholder PNG saved to {}", output_path.display());

    Ok(())
}
