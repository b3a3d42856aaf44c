//! Batch compilation of register operation sequences
//!
//! Multi-step hardware sequences (start condition, poll-until-bit,
//! write, restart, stop, ...) go to the device as a single wire
//! transaction to avoid per-step round-trip latency. A [`Batch`] is the
//! ordered builder for such a sequence: operations are appended, the
//! interesting ones are marked as results, and the whole thing is
//! serialized once and reused on every run.

use heapless::Vec as BoundedVec;
use once_cell::sync::OnceCell;

use crate::codec::{Operation, Width};
use crate::error::{CoreError, Result};
use crate::frame::Framing;

/// Hard cap on operations per batch - the device's onboard operation
/// buffer limit.
pub const MAX_BATCH_OPS: usize = 50;

/// Decoded result of one batch run
///
/// Replicates the source protocol's ergonomic collapse: exactly one
/// marked operation yields the bare scalar, anything else yields a
/// list. With zero marks the full decoded field list is returned
/// unprojected (one field per operation, writes included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchResult {
    /// Value of the single marked operation
    Value(u32),
    /// Values of the marked operations in mark order, or every field
    /// when nothing was marked
    Fields(Vec<u32>),
}

impl BatchResult {
    /// The scalar, if exactly one operation was marked
    pub fn value(&self) -> Option<u32> {
        match self {
            BatchResult::Value(v) => Some(*v),
            BatchResult::Fields(_) => None,
        }
    }

    /// All carried values, scalar included
    pub fn into_vec(self) -> Vec<u32> {
        match self {
            BatchResult::Value(v) => vec![v],
            BatchResult::Fields(fields) => fields,
        }
    }
}

/// An ordered, cacheable sequence of register operations
///
/// Built once by application code and optionally executed many times:
/// the serialized command is memoized on first use and reused verbatim
/// afterwards. Caller contract, not an enforced lock: treat a batch as
/// closed for appends once it has been serialized or run. Operations
/// whose register values change between runs must go into a fresh
/// batch.
#[derive(Debug)]
pub struct Batch {
    framing: Framing,
    ops: BoundedVec<Operation, MAX_BATCH_OPS>,
    marks: Vec<usize>,
    wire: OnceCell<String>,
}

impl Batch {
    /// Create an empty batch for a transport using `framing`
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            ops: BoundedVec::new(),
            marks: Vec::new(),
            wire: OnceCell::new(),
        }
    }

    /// Append a register write
    pub fn write(&mut self, addr: u32, value: u32, width: Width) -> Result<&mut Self> {
        self.push(Operation::Write { addr, value, width })
    }

    /// Append a register read
    pub fn read(&mut self, addr: u32, width: Width) -> Result<&mut Self> {
        self.push(Operation::Read { addr, width })
    }

    /// Append a poll-until-bit operation
    pub fn wait(&mut self, addr: u32, bit: u8, expected: bool, width: Width) -> Result<&mut Self> {
        self.push(Operation::WaitBit {
            addr,
            bit,
            expected,
            width,
        })
    }

    fn push(&mut self, op: Operation) -> Result<&mut Self> {
        self.ops
            .push(op)
            .map_err(|_| CoreError::BatchFull(MAX_BATCH_OPS))?;
        Ok(self)
    }

    /// Mark the most recently appended operation as a result slot
    ///
    /// May be called once per interesting operation; results are
    /// projected in mark order.
    pub fn mark_result(&mut self) -> &mut Self {
        debug_assert!(!self.ops.is_empty(), "mark_result before any operation");
        if !self.ops.is_empty() {
            self.marks.push(self.ops.len() - 1);
        }
        self
    }

    /// Number of appended operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether no operations have been appended
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Operations in append order
    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }

    /// Result-marked operation indices in mark order
    pub fn marks(&self) -> &[usize] {
        &self.marks
    }

    /// Serialize the batch into its wire command
    ///
    /// Operations are encoded and joined with `|`, then the transport's
    /// line terminator is appended. The first call computes and caches
    /// the string; later calls return the cached form.
    pub fn serialize(&self) -> Result<&str> {
        self.wire
            .get_or_try_init(|| {
                if self.ops.is_empty() {
                    return Err(CoreError::EmptyBatch);
                }
                let mut wire = self
                    .ops
                    .iter()
                    .map(Operation::encode)
                    .collect::<Vec<_>>()
                    .join("|");
                wire.push_str(self.framing.line_ending());
                Ok(wire)
            })
            .map(String::as_str)
    }

    /// Project decoded response fields down to the marked results
    ///
    /// Fails with [`CoreError::FieldCountMismatch`] unless the device
    /// returned exactly one field per operation.
    pub fn project(&self, fields: &[u32]) -> Result<BatchResult> {
        if fields.len() != self.ops.len() {
            return Err(CoreError::FieldCountMismatch {
                expected: self.ops.len(),
                got: fields.len(),
            });
        }

        Ok(match self.marks.as_slice() {
            [] => BatchResult::Fields(fields.to_vec()),
            [index] => BatchResult::Value(fields[*index]),
            marks => BatchResult::Fields(marks.iter().map(|&i| fields[i]).collect()),
        })
    }
}
