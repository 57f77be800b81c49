//! Push-based pipeline stages

use crate::error::ExtractError;

/// Whether a stage wants more input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep feeding
    Continue,
    /// Nothing more will be produced; upstream can stop
    Done,
}

/// One step of a byte pipeline
///
/// A stage receives input in arbitrary chunks and appends whatever it produces to
/// `out`. Once it returns [`Flow::Done`] it is not pushed again.
pub trait Stage: Send {
    /// Consume `input`, appending produced bytes to `out`
    fn push(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<Flow, ExtractError>;

    /// Upstream ended; emit anything still held back
    fn finish(&mut self, out: &mut Vec<u8>) -> Result<(), ExtractError>;
}

/// Stages chained output to input
///
/// Output of the last stage accumulates in the pipeline and is returned by
/// [`Pipeline::into_output`].
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    output: Vec<u8>,
    done: bool,
}

impl Pipeline {
    /// Chain `stages` in order
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self {
            stages,
            output: Vec::new(),
            done: false,
        }
    }

    /// Whether some stage has finished the pipeline
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one chunk from upstream
    pub fn push(&mut self, chunk: &[u8]) -> Result<Flow, ExtractError> {
        if self.done {
            return Ok(Flow::Done);
        }
        let mut input = chunk.to_vec();
        for index in 0..self.stages.len() {
            let Some(stage) = self.stages.get_mut(index) else {
                break;
            };
            let mut produced = Vec::new();
            let flow = stage.push(&input, &mut produced)?;
            input = produced;
            if flow == Flow::Done {
                self.drain_from(index + 1, input)?;
                self.done = true;
                return Ok(Flow::Done);
            }
        }
        self.output.extend_from_slice(&input);
        Ok(Flow::Continue)
    }

    /// Signal the end of upstream input
    pub fn finish(&mut self) -> Result<(), ExtractError> {
        if self.done {
            return Ok(());
        }
        self.done = true;
        let mut carried = Vec::new();
        for stage in &mut self.stages {
            let mut produced = Vec::new();
            let flow = stage.push(&carried, &mut produced)?;
            if flow == Flow::Continue {
                stage.finish(&mut produced)?;
            }
            carried = produced;
        }
        self.output.extend_from_slice(&carried);
        Ok(())
    }

    /// Bytes produced by the last stage
    pub fn into_output(self) -> Vec<u8> {
        self.output
    }

    /// Push `input` through stages from `start` on, then finish each of them
    fn drain_from(&mut self, start: usize, mut input: Vec<u8>) -> Result<(), ExtractError> {
        for stage in self.stages.iter_mut().skip(start) {
            let mut produced = Vec::new();
            let flow = stage.push(&input, &mut produced)?;
            if flow == Flow::Continue {
                stage.finish(&mut produced)?;
            }
            input = produced;
        }
        self.output.extend_from_slice(&input);
        Ok(())
    }
}
