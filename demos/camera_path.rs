use cueline::{PointKind, Timeline};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // x, y, z of a camera move; Catmull-Rom through the waypoints
    let mut path = Timeline::new(3)?;
    path.add(0.0, [0.0, 0.0, 10.0], PointKind::Spline4)?
        .add(1.0, [4.0, 0.5, 9.0], PointKind::Spline4)?
        .add(2.0, [6.0, 2.0, 7.5], PointKind::Spline4)?
        .add(3.0, [6.5, 4.0, 7.0], PointKind::Spline4)?
        .add(4.0, [5.0, 5.0, 8.0], PointKind::Spline4)?;

    for i in 0..=16 {
        let t = i as f64 * 0.25;
        let p = path.value(t);
        let d = path.derivative(t);
        let speed = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
        println!(
            "t={t:4.2}  pos=({:6.3}, {:6.3}, {:6.3})  speed={speed:6.3}",
            p[0], p[1], p[2]
        );
    }

    // the height track on its own, as a host boundary would see it
    let height = path.project(2)?;
    println!(
        "height at t=2.5 -> {}",
        serde_json::to_string(&height.sample(2.5))?
    );

    Ok(())
}
