//! Writes a small scene as RIB.
//!
//! ```text
//! cargo run -p rib_demo -- [output.rib]
//! ```
//!
//! Without an argument the RIB goes to standard output. `RMAN_RENDERER`
//! selects another renderer, e.g. `null`.

use log::info;
use rman::{Bridge, ParamValues, Result};

fn main() {
    env_logger::init();

    let output = std::env::args().nth(1);
    if let Err(err) = run(output.as_deref()) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn run(output: Option<&str>) -> Result<()> {
    let mut ri = Bridge::new();
    ri.error_handler(rman::ErrorPolicy::Abort)?;

    let file = output.map(|path| [path]);
    let params: Vec<(&str, ParamValues<'_>)> = file
        .as_ref()
        .map(|path| ("file", ParamValues::Strings(path)))
        .into_iter()
        .collect();
    let ctx = ri.begin("", &params)?;
    info!("Context {ctx} on {}", ri.settings().renderer);

    ri.frame_begin(1)?;
    ri.format(640, 480, 1.0)?;
    ri.projection("perspective", &[("fov", ParamValues::Floats(&[40.0]))])?;
    ri.translate(0.0, 0.0, 6.0)?;

    ri.world_begin()?;
    ri.light_source("distantlight", &[("intensity", ParamValues::Floats(&[1.2]))])?;

    let ball = ri.object_begin()?;
    ri.sphere(0.5, -0.5, 0.5, 360.0, &[])?;
    ri.object_end()?;

    for (i, color) in [[1.0, 0.2, 0.2], [0.2, 1.0, 0.2], [0.2, 0.2, 1.0]].iter().enumerate() {
        ri.attribute_begin()?;
        ri.translate(i as f32 * 1.5 - 1.5, 0.0, 0.0)?;
        ri.color(color)?;
        ri.surface("plastic", &[("Kd", ParamValues::Floats(&[0.8]))])?;
        ri.object_instance(ball)?;
        ri.attribute_end()?;
    }

    ri.attribute_begin()?;
    ri.translate(0.0, -0.5, 0.0)?;
    ri.rotate(90.0, 1.0, 0.0, 0.0)?;
    ri.polygon(&[(
        "P",
        ParamValues::Floats(&[
            -3.0, -3.0, 0.0, 3.0, -3.0, 0.0, 3.0, 3.0, 0.0, -3.0, 3.0, 0.0,
        ]),
    )])?;
    ri.attribute_end()?;

    ri.world_end()?;
    ri.frame_end()?;
    ri.end()
}
