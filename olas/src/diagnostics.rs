use std::io::Write;
use std::ops::ControlFlow;
use core::fmt::LowerExp;
use olas_core::{Iteration, IterationCallback};

/// Callback printing each homotopy step to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintIteration;

impl<F: LowerExp> IterationCallback<F> for PrintIteration
{
    fn iteration(&mut self, it: &Iteration<F>) -> ControlFlow<()>
    {
        println!("{}", it);
        ControlFlow::Continue(())
    }
}

/// Callback writing each homotopy step as a line to `W`.
///
/// A failed write aborts the solve.
pub struct IoWriteIteration<W: Write>
{
    writer: W,
}

impl<W: Write> IoWriteIteration<W>
{
    pub fn new(writer: W) -> Self
    {
        IoWriteIteration {
            writer,
        }
    }

    /// Returns the inner writer.
    pub fn into_inner(self) -> W
    {
        self.writer
    }
}

impl<F: LowerExp, W: Write> IterationCallback<F> for IoWriteIteration<W>
{
    fn iteration(&mut self, it: &Iteration<F>) -> ControlFlow<()>
    {
        match writeln!(self.writer, "{}", it) {
            Ok(_) => ControlFlow::Continue(()),
            Err(e) => {
                log::error!("{}", e);
                ControlFlow::Break(())
            },
        }
    }
}

//

#[test]
fn test_diagnostics1()
{
    use olas_core::{QProblemB, FloatGeneric};

    type L = FloatGeneric<f64>;

    let mut qp = QProblemB::<L>::new(2);
    qp.set_h(&[1., 0., 0., 1.]).unwrap();
    qp.set_g(&[-1., -1.]).unwrap();
    qp.set_bounds(&[0., 0.], &[0.3, 10.]).unwrap();

    let mut buf = Vec::new();
    let nwsr = qp.init(10, IoWriteIteration::new(&mut buf)).unwrap();

    let out = String::from_utf8(buf).unwrap();
    assert_eq!(out.lines().count(), nwsr);
    assert!(out.contains("add bound 0 at upper"));
}
