use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use satquery::*;

fn main() {
    env_logger::init();

    let matches = App::new("satquery")
        .about("Satisfiability queries under assumptions")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("classify")
                .about("classify domains by category -> domain rules")
                .arg(
                    Arg::with_name("rule")
                        .long("rule")
                        .help("a CATEGORY=DOMAIN rule (defaults to the email example)")
                        .takes_value(true)
                        .multiple(true)
                        .number_of_values(1),
                )
                .arg(Arg::with_name("DOMAIN").required(true).multiple(true)),
        )
        .subcommand(
            SubCommand::with_name("solve")
                .about("solve clauses given as signed integers")
                .arg(
                    Arg::with_name("clause")
                        .long("clause")
                        .help("a clause such as \"-1 3\"")
                        .takes_value(true)
                        .allow_hyphen_values(true)
                        .multiple(true)
                        .number_of_values(1),
                )
                .arg(
                    Arg::with_name("assume")
                        .long("assume")
                        .help("a literal to assume")
                        .takes_value(true)
                        .allow_hyphen_values(true)
                        .multiple(true)
                        .number_of_values(1),
                ),
        )
        .get_matches();

    let exit_code = match matches.subcommand() {
        ("classify", Some(m)) => classify(m),
        ("solve", Some(m)) => solve(m),
        _ => unreachable!("clap requires a subcommand"),
    };
    std::process::exit(exit_code);
}

fn classify(matches: &ArgMatches) -> i32 {
    let config = match matches.values_of("rule") {
        Some(rules) => match config_from_rules(rules) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("invalid rule: {}", e);
                return -1;
            }
        },
        None => ClassifierConfig::email(),
    };

    let mut classifier = match Classifier::new(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("invalid configuration: {:?}", e);
            return -1;
        }
    };

    for domain in matches.values_of("DOMAIN").into_iter().flatten() {
        match classifier.eval(domain) {
            Ok(c) => println!("{}: {}", domain, c),
            Err(e) => {
                eprintln!("classification error: {:?}", e);
                return -1;
            }
        }
    }
    0
}

// Categories are numbered first, then domains, each in order of first appearance.
fn config_from_rules<'a>(rules: impl Iterator<Item = &'a str>) -> Result<ClassifierConfig, String> {
    let rules = rules
        .map(|rule| match rule.split_once('=') {
            Some((c, d)) if !c.is_empty() && !d.is_empty() => Ok((c, d)),
            _ => Err(format!("expected CATEGORY=DOMAIN, got {:?}", rule)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut categories: Vec<&str> = vec![];
    let mut domains: Vec<&str> = vec![];
    for &(c, d) in &rules {
        if !categories.contains(&c) {
            categories.push(c);
        }
        if !domains.contains(&d) {
            domains.push(d);
        }
    }

    let mut config = ClassifierConfig::new();
    for (i, c) in categories.iter().enumerate() {
        config = config.category(c, i as i32 + 1);
    }
    for (i, d) in domains.iter().enumerate() {
        config = config.domain(d, (categories.len() + i) as i32 + 1);
    }
    for (c, d) in rules {
        config = config.rule(c, d);
    }
    Ok(config)
}

fn solve(matches: &ArgMatches) -> i32 {
    let mut session = Session::new();
    for clause in matches.values_of("clause").into_iter().flatten() {
        let result = parse_integers(clause)
            .and_then(|literals| session.add_clause(&literals).map_err(|e| format!("{:?}", e)));
        if let Err(e) = result {
            eprintln!("invalid clause {:?}: {}", clause, e);
            return -1;
        }
    }

    let assumptions = matches
        .values_of("assume")
        .into_iter()
        .flatten()
        .map(parse_integers)
        .collect::<Result<Vec<_>, _>>();
    let assumptions = match assumptions {
        Ok(a) => a.concat(),
        Err(e) => {
            eprintln!("invalid assumption: {}", e);
            return -1;
        }
    };

    match session.solve(&assumptions) {
        Ok(SatResult::Satisfiable) => {
            println!("s SATISFIABLE");
            if let Some(model) = session.model() {
                println!("{}", model);
            }
            0
        }
        Ok(SatResult::Unsatisfiable) => {
            println!("s UNSATISFIABLE");
            1
        }
        Err(e) => {
            eprintln!("invalid assumption: {:?}", e);
            -1
        }
    }
}

fn parse_integers(s: &str) -> Result<Vec<i32>, String> {
    s.split_whitespace()
        .map(|x| x.parse::<i32>().map_err(|_| format!("invalid literal {:?}", x)))
        .collect()
}
