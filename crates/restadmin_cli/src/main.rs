/* 📖 # Why does the CLI print entities as JSON?

The CLI is a thin driver over the engine, run from the workspace directory (the
one holding `restadmin.toml`):

1. Run `restadmin <command> <module> [args]`
2. Entities are printed as pretty JSON with the same snake_case keys the payload
   files use, so output can be edited and fed back into `update-db`

Payload paths are relative to the workspace directory.

Exit codes:
- 0: Success
- 1: Error (configuration not found, or a failed operation)
- 2: Bad usage, reported by clap
*/

use std::env;
use std::process;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::error;

use restadmin_base::tracing::init_tracing;
use restadmin_base::{FilePath, PalHandle, RealPal, RestAdminError, RestAdminResult, ResultExt};
use restadmin_engine::{
    CONFIG_FILE_NAME, DbConnectedRestServiceEntity, DeleteMode, ModelFactory, RestService,
    load_config,
};

#[derive(Debug, Parser)]
#[command(name = "restadmin", version)]
#[command(about = "Administer db-connected REST services", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// List the module's REST services
    List {
        /// Module name
        module: String,
    },
    /// Show one REST service
    Fetch {
        /// Module name
        module: String,
        /// Controller service name, e.g. `BarConf\Rest\Barbaz\Controller`
        controller: String,
    },
    /// Create a db-connected REST service from a JSON payload
    CreateDb {
        /// Module name
        module: String,
        /// Path to the JSON payload
        payload: String,
    },
    /// Update a db-connected REST service from a JSON payload
    UpdateDb {
        /// Module name
        module: String,
        /// Path to the JSON payload; must name the resource class
        payload: String,
    },
    /// Delete a db-connected REST service
    DeleteDb {
        /// Module name
        module: String,
        /// Controller service name
        controller: String,
        /// Also remove the generated source directory
        #[arg(long)]
        recursive: bool,
    },
}

fn main() {
    if let Err(e) = init_tracing() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let cli = Cli::parse();

    let current_dir = env::current_dir().unwrap_or_else(|e| {
        eprintln!("Error: Failed to get current directory: {}", e);
        process::exit(1);
    });
    let pal = PalHandle::new(RealPal::new(current_dir));

    match run(&pal, cli.command) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!(error = ?e, "command failed");
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run(pal: &PalHandle, command: Command) -> RestAdminResult<String> {
    let config = load_config(pal, &FilePath::from(CONFIG_FILE_NAME))?;
    let factory = ModelFactory::from_config(pal.clone(), &config)?;

    let output = match command {
        Command::List { module } => {
            let services = factory.rest_service_model(&module)?.fetch_all()?;
            Value::Array(services.iter().map(to_json).collect())
        }
        Command::Fetch { module, controller } => {
            to_json(&factory.rest_service_model(&module)?.fetch(&controller)?)
        }
        Command::CreateDb { module, payload } => {
            let mut entity = load_payload(pal, &payload)?;
            let model = factory.db_connected_model(&module)?;
            Value::Object(model.create_service(&mut entity)?.get_array_copy())
        }
        Command::UpdateDb { module, payload } => {
            let entity = load_payload(pal, &payload)?;
            let model = factory.db_connected_model(&module)?;
            Value::Object(model.update_service(&entity)?.get_array_copy())
        }
        Command::DeleteDb {
            module,
            controller,
            recursive,
        } => {
            let mode = if recursive {
                DeleteMode::Recursive
            } else {
                DeleteMode::ConfigOnly
            };
            let model = factory.db_connected_model(&module)?;
            let entity = model.fetch(&controller)?.into_db_connected().ok_or_else(|| {
                Box::new(RestAdminError::validation(format!(
                    "'{}' is not a db-connected REST service",
                    controller
                )))
            })?;
            model.delete_service(&entity, mode)?;
            Value::String(format!("deleted {}", controller))
        }
    };

    serde_json::to_string_pretty(&output)
        .map_err(|e| restadmin_base::err!("Failed to format output: {}", e))
}

fn to_json(service: &RestService) -> Value {
    Value::Object(service.get_array_copy())
}

fn load_payload(pal: &PalHandle, path: &str) -> RestAdminResult<DbConnectedRestServiceEntity> {
    let path = FilePath::from(path);
    let text = pal
        .read_file_to_string(&path)
        .with_context(|| format!("Failed to read payload '{}'", path))?;
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(data)) => DbConnectedRestServiceEntity::from_array(&data)
            .with_context(|| format!("Invalid payload '{}'", path)),
        Ok(_) => Err(Box::new(RestAdminError::validation(format!(
            "payload '{}' must be a JSON mapping",
            path
        )))),
        Err(e) => Err(Box::new(RestAdminError::validation(format!(
            "payload '{}' is not valid JSON: {}",
            path, e
        )))),
    }
}
