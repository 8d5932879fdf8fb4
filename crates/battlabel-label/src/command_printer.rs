use crate::job::LabelJob;
use crate::printer::Printer;
use crate::spool::{spool_dir_from, write_spool_file, IMAGE_FILE_NAME, TEXT_FILE_NAME};
use async_trait::async_trait;
use battlabel_core::PrinterError;
use std::path::PathBuf;

#[derive(Debug, Clone)]
struct CommandSettings {
    program: String,
    args: Vec<String>,
    spool_dir: PathBuf,
}

/// Spools the label files, then hands them to an external print command.
///
/// `args` may reference `{image}`, `{text}` and `{identifier}`; each is
/// replaced per job before the command runs.
pub struct CommandPrinter {
    settings: Option<CommandSettings>,
}

impl CommandPrinter {
    pub fn new() -> Self {
        Self { settings: None }
    }
}

impl Default for CommandPrinter {
    fn default() -> Self {
        Self::new()
    }
}

fn substitute(arg: &str, image: &str, text: &str, identifier: &str) -> String {
    arg.replace("{image}", image)
        .replace("{text}", text)
        .replace("{identifier}", identifier)
}

fn parse_settings(config: &toml::Value) -> Result<CommandSettings, PrinterError> {
    let program = config
        .get("program")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            PrinterError::InitializationFailed("missing 'program' in command printer config".to_string())
        })?
        .to_string();

    let args = match config.get("args") {
        None => Vec::new(),
        Some(toml::Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    PrinterError::InitializationFailed("'args' entries must be strings".to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(PrinterError::InitializationFailed(
                "'args' must be an array of strings".to_string(),
            ))
        }
    };

    Ok(CommandSettings {
        program,
        args,
        spool_dir: spool_dir_from(config)?,
    })
}

#[async_trait]
impl Printer for CommandPrinter {
    fn name(&self) -> &str {
        "command"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), PrinterError> {
        let settings = parse_settings(&config)?;
        std::fs::create_dir_all(&settings.spool_dir)?;
        self.settings = Some(settings);
        Ok(())
    }

    async fn print(&self, job: &LabelJob) -> Result<(), PrinterError> {
        let settings = self
            .settings
            .as_ref()
            .ok_or_else(|| PrinterError::PrintFailed("not initialized".to_string()))?;

        let image = write_spool_file(&settings.spool_dir, IMAGE_FILE_NAME, &job.image_png)?;
        let text = write_spool_file(
            &settings.spool_dir,
            TEXT_FILE_NAME,
            job.fields_text().as_bytes(),
        )?;
        let image = image.to_string_lossy();
        let text = text.to_string_lossy();

        let args: Vec<String> = settings
            .args
            .iter()
            .map(|a| substitute(a, &image, &text, job.identifier()))
            .collect();

        tracing::debug!(program = %settings.program, ?args, "running print command");
        let output = tokio::process::Command::new(&settings.program)
            .args(&args)
            .output()
            .await
            .map_err(|e| PrinterError::PrintFailed(format!("{}: {}", settings.program, e)))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(PrinterError::PrintFailed(format!(
                "{} exited with {}: {}",
                settings.program,
                output.status,
                stderr.trim()
            )))
        }
    }

    fn is_healthy(&self) -> bool {
        self.settings.is_some()
    }

    async fn shutdown(&self) -> Result<(), PrinterError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battlabel_core::LabelPayload;

    fn config(program: &str, args: &[&str], dir: &std::path::Path) -> toml::Value {
        let mut t = toml::map::Map::new();
        t.insert("program".to_string(), toml::Value::String(program.to_string()));
        t.insert(
            "args".to_string(),
            toml::Value::Array(
                args.iter()
                    .map(|a| toml::Value::String(a.to_string()))
                    .collect(),
            ),
        );
        t.insert(
            "spool_dir".to_string(),
            toml::Value::String(dir.to_string_lossy().to_string()),
        );
        toml::Value::Table(t)
    }

    fn job() -> LabelJob {
        LabelJob::new(
            LabelPayload {
                identifier: "FFEEDDCCBBAA".to_string(),
                voltage: 3500,
                product: None,
                lot_number: "42".to_string(),
                date: "03/07/26".to_string(),
                text: "S/N: FFEEDDCCBBAA".to_string(),
                qr_data: "FFEEDDCCBBAA+42".to_string(),
            },
            b"png".to_vec(),
        )
    }

    #[test]
    fn test_substitute_placeholders() {
        assert_eq!(
            substitute("--img={image} {identifier}", "/t/q.png", "/t/l.txt", "AB"),
            "--img=/t/q.png AB"
        );
        assert_eq!(substitute("{text}", "i", "/t/l.txt", "AB"), "/t/l.txt");
        assert_eq!(substitute("plain", "i", "t", "AB"), "plain");
    }

    #[test]
    fn test_parse_settings_requires_program() {
        let empty = toml::Value::Table(Default::default());
        assert!(matches!(
            parse_settings(&empty),
            Err(PrinterError::InitializationFailed(_))
        ));
    }

    #[test]
    fn test_parse_settings_rejects_non_string_args() {
        let mut t = toml::map::Map::new();
        t.insert("program".to_string(), toml::Value::String("lp".to_string()));
        t.insert(
            "args".to_string(),
            toml::Value::Array(vec![toml::Value::Integer(1)]),
        );
        assert!(matches!(
            parse_settings(&toml::Value::Table(t)),
            Err(PrinterError::InitializationFailed(_))
        ));
    }

    #[test]
    fn test_parse_settings_defaults() {
        let mut t = toml::map::Map::new();
        t.insert("program".to_string(), toml::Value::String("lp".to_string()));
        let settings = parse_settings(&toml::Value::Table(t)).unwrap();
        assert_eq!(settings.program, "lp");
        assert!(settings.args.is_empty());
        assert_eq!(settings.spool_dir, PathBuf::from("temp"));
    }

    #[tokio::test]
    async fn test_command_printer_print_before_initialize_fails() {
        let printer = CommandPrinter::new();
        assert!(!printer.is_healthy());
        assert!(matches!(
            printer.print(&job()).await,
            Err(PrinterError::PrintFailed(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_printer_success_spools_files() {
        let dir = std::env::temp_dir().join("battlabel_command_printer_ok");
        let _ = std::fs::remove_dir_all(&dir);

        let mut printer = CommandPrinter::new();
        printer
            .initialize(config("true", &["{image}", "{identifier}"], &dir))
            .await
            .unwrap();
        assert!(printer.is_healthy());
        printer.print(&job()).await.unwrap();

        assert_eq!(std::fs::read(dir.join("qrcode.png")).unwrap(), b"png");
        assert!(dir.join("label.txt").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_printer_nonzero_exit_fails() {
        let dir = std::env::temp_dir().join("battlabel_command_printer_fail");
        let _ = std::fs::remove_dir_all(&dir);

        let mut printer = CommandPrinter::new();
        printer.initialize(config("false", &[], &dir)).await.unwrap();
        match printer.print(&job()).await {
            Err(PrinterError::PrintFailed(msg)) => assert!(msg.contains("false")),
            other => panic!("expected PrintFailed, got {:?}", other),
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_command_printer_missing_program_fails() {
        let dir = std::env::temp_dir().join("battlabel_command_printer_missing");
        let _ = std::fs::remove_dir_all(&dir);

        let mut printer = CommandPrinter::new();
        printer
            .initialize(config("battlabel-no-such-program", &[], &dir))
            .await
            .unwrap();
        assert!(matches!(
            printer.print(&job()).await,
            Err(PrinterError::PrintFailed(_))
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
