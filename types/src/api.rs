use crate::execution::Transaction;
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadRangeExt, Write};

/// Maximum number of transactions that can be submitted in a single submission
pub const MAX_SUBMISSION_TRANSACTIONS: usize = 128;

/// A batch of signed transactions posted to the ledger host.
///
/// The batch is executed as a unit, in order, after every signature verifies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub transactions: Vec<Transaction>,
}

impl Write for Submission {
    fn write(&self, writer: &mut impl BufMut) {
        self.transactions.write(writer);
    }
}

impl Read for Submission {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let transactions = Vec::<Transaction>::read_range(reader, 1..=MAX_SUBMISSION_TRANSACTIONS)?;
        Ok(Self { transactions })
    }
}

impl EncodeSize for Submission {
    fn encode_size(&self) -> usize {
        self.transactions.encode_size()
    }
}
