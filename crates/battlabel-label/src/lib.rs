pub mod command_printer;
pub mod composer;
pub mod file_printer;
pub mod host;
pub mod job;
pub mod printer;
pub mod qr;
pub mod registry;
pub mod spool;

pub use command_printer::CommandPrinter;
pub use composer::{compose, LabelComposer};
pub use file_printer::FilePrinter;
pub use host::PrinterHost;
pub use job::LabelJob;
pub use printer::Printer;
pub use qr::{render_qr, render_qr_png};
pub use registry::PrinterRegistry;
