use std::{fmt::Write, str::FromStr};

use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command, builder::PossibleValuesParser, value_parser};
use ndarray::Array1;
use strum::IntoEnumIterator;

use crate::{
    invopt_framework::experiment_config::ExperimentConfig,
    techniques::experiment::{EstimatorKind, Scenario},
};

pub const INVOPT_COMMANDS: InvoptCommand = InvoptCommand::Group {
    name_short: "invopt",
    name_long: None,
    explanation_short: "invopt: estimate linear objectives from observed optimal decisions.",
    explanation_long: None,
    children: &[&INVOPT_EXPERIMENT, &INVOPT_COMPARE],
};

pub const INVOPT_EXPERIMENT: InvoptCommand = InvoptCommand::Command {
    name_short: "exp",
    name_long: Some("experiment"),
    explanation_short: "Fit one estimator on generated data and evaluate it on held-out instances.",
    explanation_long: Some(
        "Generate a hidden objective, a (possibly noisy) training set and a noiseless test set, fit the chosen estimator on the training set and report the parameter error, decision error and relative objective gap on the test set.",
    ),
    cli_command: Some(|command| cli_estimator(cli_scenario(command))),
    execute: |cli_matches| {
        let (config, p_true, noise) = scenario_from_matches(cli_matches)?;
        let kind = estimator_from_matches(cli_matches)?;
        let scenario = Scenario::generate(&config, p_true, noise)?;
        let result = scenario.run(kind)?;
        Ok(result.to_string())
    },
};

pub const INVOPT_COMPARE: InvoptCommand = InvoptCommand::Command {
    name_short: "cmp",
    name_long: Some("compare"),
    explanation_short: "Fit every estimator on the same generated data.",
    explanation_long: None,
    cli_command: Some(cli_scenario),
    execute: |cli_matches| {
        let (config, p_true, noise) = scenario_from_matches(cli_matches)?;
        let scenario = Scenario::generate(&config, p_true, noise)?;
        let mut f = String::new();
        for kind in EstimatorKind::iter() {
            let result = scenario
                .run(kind)
                .with_context(|| format!("running the {} estimator", kind))?;
            writeln!(f, "{}\n", result)?;
        }
        Ok(f.trim_end().to_string())
    },
};

pub const ARG_ID_VERBOSE: &str = "verbose";

pub enum InvoptCommand {
    Group {
        name_short: &'static str,
        name_long: Option<&'static str>,
        explanation_short: &'static str,
        explanation_long: Option<&'static str>,
        children: &'static [&'static InvoptCommand],
    },
    Command {
        name_short: &'static str,
        name_long: Option<&'static str>,
        explanation_short: &'static str,
        explanation_long: Option<&'static str>,
        cli_command: Option<fn(command: Command) -> Command>, //adds the arguments of the command
        execute: fn(cli_matches: &ArgMatches) -> Result<String>,
    },
}

impl InvoptCommand {
    pub fn build_cli(&self) -> Command {
        let mut command;
        match self {
            InvoptCommand::Group {
                name_short,
                name_long,
                explanation_short,
                explanation_long,
                children,
            } => {
                command = Command::new(self.long_name().to_string())
                    .about(*explanation_short)
                    .subcommand_required(true)
                    .allow_external_subcommands(false);

                if name_long.is_some() {
                    command = command.alias(*name_short);
                }

                if let Some(l) = explanation_long {
                    command = command.long_about(*l);
                }

                for child in children.iter() {
                    command = command.subcommand(child.build_cli());
                }
            }
            InvoptCommand::Command {
                name_short,
                name_long,
                explanation_short,
                explanation_long,
                cli_command,
                ..
            } => {
                command = Command::new(self.long_name().to_string()).about(*explanation_short);

                if name_long.is_some() {
                    command = command.alias(*name_short);
                }

                if let Some(l) = explanation_long {
                    command = command.long_about(*l);
                }

                if let Some(f) = cli_command {
                    command = (f)(command);
                }
            }
        };
        command
    }

    /// The root command with the global verbosity flag.
    pub fn build_root_cli(&self) -> Command {
        self.build_cli().arg(
            Arg::new(ARG_ID_VERBOSE)
                .short('v')
                .long(ARG_ID_VERBOSE)
                .action(ArgAction::Count)
                .global(true)
                .help("Log more; repeat for more detail."),
        )
    }

    pub fn long_name(&self) -> &str {
        match self {
            InvoptCommand::Group {
                name_short,
                name_long,
                ..
            }
            | InvoptCommand::Command {
                name_short,
                name_long,
                ..
            } => name_long.unwrap_or(*name_short),
        }
    }

    pub fn execute(&self, cli_matches: &ArgMatches) -> Result<String> {
        match self {
            InvoptCommand::Group { children, .. } => {
                for child in children.iter() {
                    if let Some(sub_matches) = cli_matches.subcommand_matches(child.long_name()) {
                        log::info!("execute {}", child.long_name());
                        return child.execute(sub_matches);
                    }
                }
                Err(anyhow!("command not recognised"))
            }
            InvoptCommand::Command { execute, .. } => (execute)(cli_matches),
        }
    }
}

pub fn cli_scenario(command: Command) -> Command {
    let defaults = ExperimentConfig::default();
    command
        .arg(
            Arg::new("vars")
                .action(ArgAction::Set)
                .value_name("NUMBER")
                .short('n')
                .long("vars")
                .help("Number of decision variables.")
                .default_value(defaults.n_vars.to_string())
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("constraints")
                .action(ArgAction::Set)
                .value_name("NUMBER")
                .short('m')
                .long("constraints")
                .help("Number of inequality constraints.")
                .default_value(defaults.n_constrs.to_string())
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("equalities")
                .action(ArgAction::Set)
                .value_name("NUMBER")
                .long("equalities")
                .help("Number of equality constraints.")
                .default_value(defaults.n_eq_constrs.to_string())
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("upperbounds")
                .action(ArgAction::SetTrue)
                .long("upper-bounds")
                .help("Give every variable a random upper bound."),
        )
        .arg(
            Arg::new("train")
                .action(ArgAction::Set)
                .value_name("NUMBER")
                .long("train")
                .help("Number of training observations.")
                .default_value(defaults.n_samples_train.to_string())
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("test")
                .action(ArgAction::Set)
                .value_name("NUMBER")
                .long("test")
                .help("Number of test instances.")
                .default_value(defaults.n_samples_test.to_string())
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("seed")
                .action(ArgAction::Set)
                .value_name("NUMBER")
                .short('s')
                .long("seed")
                .help("Seed of the random source; the same seed generates the same data.")
                .default_value(defaults.scenario_id.to_string())
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("noise")
                .action(ArgAction::Set)
                .value_name("NUMBER")
                .long("noise")
                .help("Standard deviation of the noise on the objective of the training observations.")
                .default_value("0")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("ptrue")
                .action(ArgAction::Set)
                .value_name("COEFFICIENTS")
                .long("p-true")
                .help("Comma-separated hidden objective; sampled if absent.")
                .value_delimiter(',')
                .num_args(1..)
                .value_parser(value_parser!(f64)),
        )
}

pub fn cli_estimator(command: Command) -> Command {
    command.arg(
        Arg::new("estimator")
            .action(ArgAction::Set)
            .value_name("ESTIMATOR")
            .short('e')
            .long("estimator")
            .help("The estimator to fit.")
            .default_value(<&'static str>::from(EstimatorKind::Strict))
            .value_parser(PossibleValuesParser::new(
                EstimatorKind::iter().map(<&'static str>::from),
            )),
    )
}

pub fn scenario_from_matches(
    cli_matches: &ArgMatches,
) -> Result<(ExperimentConfig, Option<Array1<f64>>, f64)> {
    let get_usize = |id: &str| -> Result<usize> {
        cli_matches
            .get_one::<usize>(id)
            .copied()
            .with_context(|| format!("argument {}", id))
    };

    let config = ExperimentConfig {
        n_vars: get_usize("vars")?,
        n_constrs: get_usize("constraints")?,
        n_eq_constrs: get_usize("equalities")?,
        use_x_ub: cli_matches.get_flag("upperbounds"),
        n_samples_train: get_usize("train")?,
        n_samples_test: get_usize("test")?,
        scenario_id: *cli_matches.get_one::<u64>("seed").context("argument seed")?,
        ..ExperimentConfig::default()
    };
    config.validate()?;

    let noise = *cli_matches.get_one::<f64>("noise").context("argument noise")?;

    let p_true = match cli_matches.get_many::<f64>("ptrue") {
        Some(values) => {
            let p_true = Array1::from_iter(values.copied());
            if p_true.len() != config.n_vars {
                return Err(anyhow!(
                    "the hidden objective has {} coefficients, but there are {} variables",
                    p_true.len(),
                    config.n_vars
                ));
            }
            Some(p_true)
        }
        None => None,
    };

    Ok((config, p_true, noise))
}

pub fn estimator_from_matches(cli_matches: &ArgMatches) -> Result<EstimatorKind> {
    let name = cli_matches
        .get_one::<String>("estimator")
        .context("argument estimator")?;
    EstimatorKind::from_str(name).with_context(|| format!("estimator {}", name))
}
