//! Record-oriented reading and writing on top of the column shredders and
//! assemblers.

mod reader;
mod value;
mod writer;

pub use reader::RecordReader;
pub use value::{Value, ValueBuilder};
pub use writer::RecordWriter;
