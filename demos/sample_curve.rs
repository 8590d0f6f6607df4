use cueline::{PointKind, Timeline};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut curve = Timeline::new(1)?;
    curve
        .add(0.0, 0.0, PointKind::Smooth)?
        .add(1.0, 1.0, PointKind::Smooth)?
        .add(2.0, -0.5, PointKind::symmetric_user(0.0))?
        .add(3.0, 2.0, PointKind::Linear)?
        .add(4.0, 2.0, PointKind::Constant)?
        .add(5.0, 0.0, PointKind::Linear)?;

    println!("{:>6}  {:>9}  {:>9}", "t", "value", "d/dt");
    for i in -2..=22 {
        let t = i as f64 * 0.25;
        let v = curve.value(t);
        let d = curve.derivative(t);
        println!("{t:6.2}  {:9.4}  {:9.4}", v[0], d[0]);
    }

    Ok(())
}
