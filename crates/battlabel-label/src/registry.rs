use crate::printer::Printer;
use battlabel_core::PrinterError;
use std::collections::HashMap;

pub struct PrinterRegistry {
    factories: HashMap<String, fn() -> Box<dyn Printer>>,
}

impl PrinterRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("file", || Box::new(crate::file_printer::FilePrinter::new()));
        registry.register("command", || {
            Box::new(crate::command_printer::CommandPrinter::new())
        });
        registry
    }

    pub fn register(&mut self, name: &str, factory: fn() -> Box<dyn Printer>) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Printer>, PrinterError> {
        self.factories
            .get(name)
            .map(|f| f())
            .ok_or_else(|| PrinterError::NotFound(name.to_string()))
    }

    pub fn list_printers(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for PrinterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
