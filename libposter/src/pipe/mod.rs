//! Value-passing pipeline stages.
//!
//! A stage consumes its input and hands back a new value; stages hold only
//! their configuration so the same chain can run any number of times.

mod chained;
pub use chained::ChainedPipe;

pub trait Pipe {
    type Input;
    type Output;

    type Error;

    fn process(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;

    fn pipe<P>(self, other: P) -> ChainedPipe<Self, P>
    where
        Self: Sized,
        P: Pipe<Input = Self::Output, Error = Self::Error>,
    {
        ChainedPipe::new(self, other)
    }
}

impl<P: Pipe + ?Sized> Pipe for &P {
    type Input = P::Input;
    type Output = P::Output;
    type Error = P::Error;

    fn process(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        (**self).process(input)
    }
}
