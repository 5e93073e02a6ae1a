use fitting::{FittingError, PhotoRejection};

pub fn report_error(err: &FittingError) {
    match err {
        FittingError::InvalidPhoto(PhotoRejection::TooSmall { .. }) => {
            eprintln!("{err}");
            eprintln!();
            eprintln!("Use a photo of at least 300x400 pixels showing your upper body.");
        }
        FittingError::InvalidPhoto(_) => {
            eprintln!("{err}");
            eprintln!();
            eprintln!("Retake the photo in even lighting, or drop --strict-photo to render anyway.");
        }
        FittingError::Fetch { .. } | FittingError::ImageLoadFailed { .. } => {
            eprintln!("{err}");
            #[cfg(feature = "remote")]
            {
                eprintln!();
                eprintln!(
                    "If the host blocks direct downloads, set {} (or --cors-relay) to a relay prefix.",
                    fitting::ENV_CORS_RELAY
                );
            }
        }
        FittingError::Catalog(_) => {
            eprintln!("{err}");
            eprintln!();
            eprintln!("Product files use camelCase keys: id, name, category, image, tryOnImages, variants.");
        }
        _ => {
            eprintln!("{err}");
        }
    }
}
