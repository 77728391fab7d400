use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use servisoft_api::RestClient;
use servisoft_core::{
    CoreConfig, DashboardStats, DeskError, DeskResult, EnvOverrides, Eps, EstadoCliente,
    EstadoTarea, FileConfig, IdNumber, Notification, Parentesco, PatientFilter, PatientForm,
    PatientPayload, PatientRegistry, Prioridad, ReconcileAction, Session, SessionStore,
    TaskBoard, TaskFilter, TaskForm, TipoIdentificacion, TipoPaciente, UserInfo,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;

#[derive(Parser)]
#[command(name = "servisoft")]
#[command(about = "ServiSoft clinic desk: patients and appointment tasks")]
struct Cli {
    /// YAML configuration file (overrides SERVISOFT_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the token issued by the login service
    Login {
        #[arg(long)]
        token: String,
        /// Display name of the user
        #[arg(long)]
        name: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Patient count and pending tasks
    Stats,
    /// Patient registry
    #[command(subcommand)]
    Patients(PatientCommand),
    /// Task board
    #[command(subcommand)]
    Tasks(TaskCommand),
}

#[derive(Subcommand)]
enum PatientCommand {
    /// List patients
    List(PatientFilterArgs),
    /// Show one patient
    Show { numero: String },
    /// Create a cotizante, or update one with --edit
    SaveCotizante {
        /// Id-number of the cotizante being edited
        #[arg(long)]
        edit: Option<String>,
        #[command(flatten)]
        fields: PatientFields,
    },
    /// Create a beneficiario, or update one with --edit
    SaveBeneficiario {
        /// Id-number of the beneficiario being edited
        #[arg(long)]
        edit: Option<String>,
        #[command(flatten)]
        fields: PatientFields,
        #[arg(long)]
        parentesco: Option<Parentesco>,
        /// Id-number of the insured cotizante
        #[arg(long)]
        cotizante: Option<String>,
    },
    /// Delete a patient
    Delete {
        numero: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Write reporte_clientes.csv for the (filtered) patients
    Export {
        #[command(flatten)]
        filter: PatientFilterArgs,
        /// Output directory (defaults to the configured export dir)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum TaskCommand {
    /// Show the five-column board
    Board(TaskFilterArgs),
    /// Show one task with its observations
    Show { id: i64 },
    /// Move a task to its next state
    Advance { id: i64 },
    /// Create a task, or update one with --edit
    Save(Box<TaskSaveArgs>),
    /// Delete a task
    Delete {
        id: i64,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// State-change history of a task
    History { id: i64 },
    /// Write Reporte_Tareas_<date>.xlsx
    Export {
        /// Output directory (defaults to the configured export dir)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Print a WhatsApp reminder link for the task's patient
    Whatsapp { id: i64 },
    /// Pending and in-progress counts
    Remind,
}

#[derive(Args, Default)]
struct PatientFilterArgs {
    #[arg(long)]
    tipo: Option<TipoPaciente>,
    #[arg(long)]
    eps: Option<Eps>,
    /// Name or id-number
    #[arg(long)]
    search: Option<String>,
}

impl PatientFilterArgs {
    fn into_filter(self) -> PatientFilter {
        PatientFilter {
            tipo: self.tipo,
            eps: self.eps,
            search: self.search,
        }
    }
}

#[derive(Args)]
struct TaskFilterArgs {
    #[arg(long)]
    estado: Option<EstadoTarea>,
    #[arg(long)]
    especialidad: Option<String>,
    #[arg(long)]
    prioridad: Option<Prioridad>,
    /// Patient name or id-number
    #[arg(long)]
    search: Option<String>,
}

#[derive(Args)]
struct PatientFields {
    #[arg(long)]
    numero: Option<String>,
    #[arg(long)]
    nombre: Option<String>,
    #[arg(long)]
    tipo_id: Option<TipoIdentificacion>,
    #[arg(long)]
    eps: Option<Eps>,
    #[arg(long)]
    celular: Option<String>,
    #[arg(long)]
    correo: Option<String>,
    #[arg(long)]
    direccion: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    fecha_nacimiento: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    fecha_expedicion: Option<String>,
    #[arg(long)]
    estado: Option<EstadoCliente>,
    #[arg(long)]
    info: Option<String>,
}

impl PatientFields {
    fn apply(self, payload: &mut PatientPayload) {
        if let Some(v) = self.numero {
            payload.numero_identificacion = v.trim().to_string();
        }
        set(&mut payload.nombre_completo, self.nombre);
        payload.tipo_identificacion = self.tipo_id.or(payload.tipo_identificacion);
        payload.eps = self.eps.or(payload.eps);
        set(&mut payload.celular, self.celular);
        set(&mut payload.correo, self.correo);
        set(&mut payload.direccion_residencia, self.direccion);
        set(&mut payload.fecha_nacimiento, self.fecha_nacimiento);
        set(&mut payload.fecha_expedicion, self.fecha_expedicion);
        payload.estado = self.estado.or(payload.estado).or(Some(EstadoCliente::Activo));
        set(&mut payload.info_adicional, self.info);
    }
}

#[derive(Args)]
struct TaskSaveArgs {
    /// Id of the task being edited
    #[arg(long)]
    edit: Option<i64>,

    /// COTIZANTE or BENEFICIARIO
    #[arg(long)]
    tipo_paciente: Option<TipoPaciente>,
    /// Patient id-number
    #[arg(long)]
    numero: Option<String>,
    #[arg(long)]
    nombre: Option<String>,
    #[arg(long)]
    tipo_id: Option<TipoIdentificacion>,
    #[arg(long)]
    celular: Option<String>,
    #[arg(long)]
    correo: Option<String>,
    #[arg(long)]
    direccion: Option<String>,
    #[arg(long)]
    eps: Option<Eps>,
    #[arg(long)]
    parentesco: Option<Parentesco>,
    /// Id-number of the insured cotizante
    #[arg(long)]
    cotizante: Option<String>,
    /// Name of the insured cotizante
    #[arg(long)]
    cotizante_nombre: Option<String>,

    #[arg(long)]
    tipo_cita: Option<String>,
    #[arg(long)]
    prioridad: Option<Prioridad>,
    #[arg(long)]
    estado: Option<EstadoTarea>,
    #[arg(long)]
    especialidad: Option<String>,
    #[arg(long)]
    autorizacion: Option<String>,
    #[arg(long)]
    orden: Option<String>,
    #[arg(long)]
    radicado: Option<String>,
    #[arg(long)]
    especificaciones: Option<String>,
    #[arg(long)]
    observacion: Option<String>,
    #[arg(long)]
    fecha_solicitud: Option<NaiveDate>,
    #[arg(long)]
    fecha_cita: Option<NaiveDate>,
    #[arg(long)]
    hora_cita: Option<String>,
    #[arg(long)]
    doctor: Option<String>,
    #[arg(long)]
    direccion_cita: Option<String>,
    #[arg(long)]
    lugar_cita: Option<String>,
    #[arg(long)]
    informacion_cita: Option<String>,
    #[arg(long)]
    confirmacion_cita: Option<String>,
}

impl TaskSaveArgs {
    /// Overlay the given flags on a (possibly pre-filled) form.
    fn apply(self, form: &mut TaskForm) {
        let p = &mut form.patient;
        p.tipo_paciente = self.tipo_paciente.or(p.tipo_paciente);
        if let Some(v) = self.numero {
            p.numero_identificacion = v;
        }
        set(&mut p.nombre_completo, self.nombre);
        p.tipo_identificacion = self.tipo_id.or(p.tipo_identificacion);
        set(&mut p.celular, self.celular);
        set(&mut p.correo, self.correo);
        set(&mut p.direccion_residencia, self.direccion);
        p.eps = self.eps.or(p.eps);
        p.parentesco = self.parentesco.or(p.parentesco);
        set(&mut p.cotizante_numero_identificacion, self.cotizante);
        set(&mut p.cotizante_nombre, self.cotizante_nombre);

        set(&mut form.tipo_cita, self.tipo_cita);
        form.prioridad = self.prioridad.or(form.prioridad);
        form.estado = self.estado.or(form.estado);
        set(&mut form.especialidad, self.especialidad);
        set(&mut form.autorizacion, self.autorizacion);
        set(&mut form.orden, self.orden);
        set(&mut form.radicado, self.radicado);
        set(&mut form.especificaciones, self.especificaciones);
        set(&mut form.observacion, self.observacion);
        form.fecha_solicitud_serviconli = self.fecha_solicitud.or(form.fecha_solicitud_serviconli);
        form.fecha_cita = self.fecha_cita.or(form.fecha_cita);
        set(&mut form.hora_cita, self.hora_cita);
        set(&mut form.doctor, self.doctor);
        set(&mut form.direccion_cita, self.direccion_cita);
        set(&mut form.lugar_cita, self.lugar_cita);
        set(&mut form.informacion_cita, self.informacion_cita);
        set(&mut form.confirmacion_cita, self.confirmacion_cita);
    }
}

fn set(field: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *field = value;
    }
}

/// Resolved configuration plus the session store it points at.
struct Desk {
    config: CoreConfig,
    store: SessionStore,
}

impl Desk {
    fn new(config_path: Option<PathBuf>) -> DeskResult<Self> {
        let env = EnvOverrides::from_lookup(|k| std::env::var(k).ok());
        let path = config_path.or_else(|| env.config_file.clone());
        let file = FileConfig::load_optional(path.as_deref())?;
        let config = CoreConfig::resolve(file, env)?;
        let store = SessionStore::new(config.session_path());
        Ok(Self { config, store })
    }

    fn client(&self) -> DeskResult<RestClient> {
        let session = self.store.require()?;
        RestClient::new(&self.config, session.token)
    }

    fn export_dir(&self, dir: Option<PathBuf>) -> PathBuf {
        dir.unwrap_or_else(|| self.config.export_dir().to_path_buf())
    }
}

/// Generic message shown when a command fails without a server message.
fn fallback(command: &Commands) -> &'static str {
    match command {
        Commands::Login { .. } | Commands::Logout | Commands::Whoami => "Error con la sesión",
        Commands::Stats => "Error al cargar las estadísticas",
        Commands::Patients(cmd) => match cmd {
            PatientCommand::List(_) | PatientCommand::Show { .. } => "Error al cargar los clientes",
            PatientCommand::SaveCotizante { .. } => "Error al guardar cotizante",
            PatientCommand::SaveBeneficiario { .. } => "Error al guardar beneficiario",
            PatientCommand::Delete { .. } => "Error al eliminar",
            PatientCommand::Export { .. } => "Error al generar el reporte de clientes",
        },
        Commands::Tasks(cmd) => match cmd {
            TaskCommand::Board(_) | TaskCommand::Show { .. } | TaskCommand::Remind => {
                "Error al cargar las tareas"
            }
            TaskCommand::Advance { .. } => "Error al actualizar la tarea",
            TaskCommand::Save(_) => "Error al guardar la tarea",
            TaskCommand::Delete { .. } => "Error al eliminar la tarea",
            TaskCommand::History { .. } => "Error al cargar el historial",
            TaskCommand::Export { .. } => "Error al generar el reporte",
            TaskCommand::Whatsapp { .. } => "Error al preparar el mensaje",
        },
    }
}

fn require_confirmation(yes: bool) -> DeskResult<()> {
    if yes {
        Ok(())
    } else {
        Err(DeskError::InvalidInput(
            "deletion needs confirmation; re-run with --yes".into(),
        ))
    }
}

async fn run_session(desk: &Desk, command: Commands) -> DeskResult<Notification> {
    match command {
        Commands::Login { token, name } => {
            desk.store.save(&Session {
                token,
                user_info: UserInfo { nombre: name },
            })?;
            Ok(Notification::success("Sesión guardada"))
        }
        Commands::Logout => {
            desk.store.clear()?;
            Ok(Notification::success("Sesión cerrada"))
        }
        Commands::Whoami => {
            let session = desk.store.require()?;
            Ok(Notification::info(format!(
                "Bienvenido, {}",
                session.display_name()
            )))
        }
        Commands::Stats => {
            let api = desk.client()?;
            let registry = PatientRegistry::load(&api).await?;
            let board = TaskBoard::load(&api, &desk.store).await?;
            let stats = DashboardStats::compute(registry.patients(), board.tasks());
            print!("{}", render::stats(&stats));
            Ok(Notification::info("Panel actualizado"))
        }
        Commands::Patients(cmd) => run_patients(desk, cmd).await,
        Commands::Tasks(cmd) => run_tasks(desk, cmd).await,
    }
}

async fn run_patients(desk: &Desk, command: PatientCommand) -> DeskResult<Notification> {
    let api = desk.client()?;
    match command {
        PatientCommand::List(filter) => {
            let registry = PatientRegistry::load(&api).await?;
            let shown = registry.filter(&filter.into_filter());
            if shown.is_empty() {
                println!("No hay clientes registrados");
            }
            for patient in &shown {
                println!("{}", render::patient_line(patient));
            }
            Ok(Notification::info(format!("{} clientes", shown.len())))
        }
        PatientCommand::Show { numero } => {
            let registry = PatientRegistry::load(&api).await?;
            print!("{}", render::patient_detail(registry.find(&numero)?));
            Ok(Notification::info("Cliente encontrado"))
        }
        PatientCommand::SaveCotizante { edit, fields } => {
            let editing = edit.map(IdNumber::new).transpose()?;
            let mut payload = match &editing {
                Some(numero) => {
                    let registry = PatientRegistry::load(&api).await?;
                    PatientPayload::from_patient(registry.find(numero.as_str())?)
                }
                None => PatientPayload::default(),
            };
            fields.apply(&mut payload);
            PatientRegistry::save_cotizante(&api, payload, editing.as_ref()).await?;
            Ok(Notification::success("Cotizante guardado"))
        }
        PatientCommand::SaveBeneficiario {
            edit,
            fields,
            parentesco,
            cotizante,
        } => {
            let editing = edit.map(IdNumber::new).transpose()?;
            let registry = PatientRegistry::load(&api).await?;
            let mut payload = match &editing {
                Some(numero) => PatientPayload::from_patient(registry.find(numero.as_str())?),
                None => PatientPayload::default(),
            };
            fields.apply(&mut payload);
            payload.parentesco = parentesco.or(payload.parentesco);
            set(&mut payload.cotizante_numero_identificacion, cotizante);
            if let Some(insured) = payload.cotizante_numero_identificacion.as_deref() {
                if !registry
                    .cotizantes()
                    .iter()
                    .any(|c| c.numero_identificacion == insured.trim())
                {
                    tracing::warn!(cotizante = insured, "insured party is not a loaded cotizante");
                }
            }
            PatientRegistry::save_beneficiario(&api, payload, editing.as_ref()).await?;
            Ok(Notification::success("Beneficiario guardado"))
        }
        PatientCommand::Delete { numero, yes } => {
            require_confirmation(yes)?;
            let numero = IdNumber::new(numero)?;
            PatientRegistry::delete(&api, &numero).await?;
            Ok(Notification::success("Cliente eliminado"))
        }
        PatientCommand::Export { filter, dir } => {
            let registry = PatientRegistry::load(&api).await?;
            let shown = registry.filter(&filter.into_filter());
            let path = servisoft_reports::write_clients_csv(&desk.export_dir(dir), &shown)?;
            Ok(Notification::success(format!(
                "Reporte generado: {}",
                path.display()
            )))
        }
    }
}

async fn run_tasks(desk: &Desk, command: TaskCommand) -> DeskResult<Notification> {
    let api = desk.client()?;
    let mut board = TaskBoard::load(&api, &desk.store).await?;
    match command {
        TaskCommand::Board(args) => {
            let filter = TaskFilter {
                estado: args.estado,
                especialidad: args.especialidad,
                prioridad: args.prioridad,
                search: args.search,
            };
            print!("{}", render::board(&board.columns(&filter)));
            let especialidades = board.especialidades();
            if !especialidades.is_empty() {
                println!("Especialidades: {}", especialidades.join(", "));
            }
            Ok(match board.reminder().message() {
                Some(message) => Notification::info(message),
                None => Notification::info(format!("{} tareas", board.tasks().len())),
            })
        }
        TaskCommand::Show { id } => {
            print!("{}", render::task_detail(board.find(id)?));
            Ok(Notification::info(format!("Tarea #{id}")))
        }
        TaskCommand::Advance { id } => match board.advance(&api, id).await? {
            Some(next) => Ok(Notification::success(format!(
                "Tarea actualizada a {}",
                next.label()
            ))),
            None => Ok(Notification::info("La tarea ya está completada")),
        },
        TaskCommand::Save(args) => {
            let mut form = match args.edit {
                Some(id) => TaskForm::from_task(board.find(id)?),
                None => TaskForm {
                    patient: PatientForm::lookup(&api, args.numero.as_deref().unwrap_or(""))
                        .await?,
                    ..Default::default()
                },
            };
            (*args).apply(&mut form);
            let outcome = board.save(&api, &api, &form).await?;
            match outcome.patient.action {
                ReconcileAction::Created => println!("Paciente creado correctamente"),
                ReconcileAction::Updated => println!("Datos del paciente actualizados"),
                ReconcileAction::Unchanged => {}
            }
            Ok(Notification::success(if outcome.updated {
                "Tarea actualizada correctamente"
            } else {
                "Tarea creada correctamente"
            }))
        }
        TaskCommand::Delete { id, yes } => {
            require_confirmation(yes)?;
            board.delete(&api, id).await?;
            Ok(Notification::success("Tarea eliminada"))
        }
        TaskCommand::History { id } => {
            board.find(id)?;
            let entries = TaskBoard::history(&api, id).await?;
            print!("{}", render::history(&entries));
            Ok(Notification::info(format!("{} cambios", entries.len())))
        }
        TaskCommand::Export { dir } => {
            let today = chrono::Local::now().date_naive();
            let path =
                servisoft_reports::write_tasks_xlsx(&desk.export_dir(dir), board.tasks(), today)?;
            Ok(Notification::success(format!(
                "Reporte generado: {}",
                path.display()
            )))
        }
        TaskCommand::Whatsapp { id } => {
            let link = servisoft_core::whatsapp::reminder_link(board.find(id)?)?;
            println!("{link}");
            Ok(Notification::success("Enlace de WhatsApp listo"))
        }
        TaskCommand::Remind => Ok(match board.reminder().message() {
            Some(message) => Notification::info(message),
            None => Notification::info("No hay tareas pendientes"),
        }),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let fallback = fallback(&cli.command);

    let result = match Desk::new(cli.config) {
        Ok(desk) => run_session(&desk, cli.command).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(notification) => {
            println!("{notification}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("{}", Notification::from_error(&e, fallback));
            ExitCode::FAILURE
        }
    }
}
