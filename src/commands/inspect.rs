use fitting::{FittingResult, ImageSource};

use crate::cli::{GlobalOptions, InspectCommand};

use super::utils::build_room;

/// The main function to run the inspect command.
pub fn run(global: &GlobalOptions, cmd: InspectCommand) -> FittingResult<()> {
    let room = build_room(global);
    let photo = room
        .loader()
        .load(&[ImageSource::parse(&cmd.photo)], None)?
        .image;
    let analysis = room.analyze_photo(&photo)?;

    let (width, height) = photo.dimensions();
    println!("Photo: {width}x{height}");
    match &analysis.stats {
        Some(stats) => println!(
            "Quality: ok (average brightness {:.1}, dark {:.1}%, bright {:.1}%)",
            stats.average_brightness,
            stats.dark_ratio * 100.0,
            stats.bright_ratio * 100.0
        ),
        None => println!("Quality: rejected"),
    }
    if let Some(ratio) = analysis.skin_ratio {
        println!("Skin: {:.1}% of pixels", ratio * 100.0);
    }
    match &analysis.face {
        Some(face) => println!(
            "Face: center ({:.0}, {:.0}), {:.0}x{:.0}, confidence {:.2}",
            face.center_x, face.center_y, face.width, face.height, face.confidence
        ),
        None => println!("Face: not detected"),
    }
    if let Some(reason) = &analysis.fallback_reason {
        println!("Fallback: {reason}");
    }
    let body = &analysis.body;
    println!(
        "Body: shoulders y={:.0}, chest y={:.0}, waist y={:.0}, width {:.0}, height {:.0}, center x={:.0}",
        body.shoulder_y,
        body.chest_y,
        body.waist_y,
        body.body_width,
        body.body_height,
        body.resolved_center_x()
    );

    Ok(())
}
