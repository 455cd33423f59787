// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

pub fn build_cli() -> Command {
    Command::new("centavo")
        .about("Personal income/expense tracker: card billing cycles, installment series, statement import")
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("kind").long("kind").default_value("bank")),
                )
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("rm").arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("card")
                .about("Manage credit cards")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("closing")
                                .long("closing")
                                .required(true)
                                .help("Day of month the invoice closes (1-31)"),
                        )
                        .arg(
                            Arg::new("due")
                                .long("due")
                                .required(true)
                                .help("Day of month the invoice is due (1-31)"),
                        )
                        .arg(Arg::new("limit").long("limit")),
                )
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("rm").arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Manage categories and subcategories")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("parent")
                                .long("parent")
                                .help("Make this a subcategory of the given category"),
                        ),
                )
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("rm")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("parent").long("parent")),
                ),
        )
        .subcommand(
            Command::new("entry")
                .about("Record and manage income/expense entries")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("description").long("description").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .help("Signed amount: negative for expenses"),
                        )
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("subcategory").long("subcategory"))
                        .arg(Arg::new("account").long("account"))
                        .arg(Arg::new("card").long("card"))
                        .arg(
                            Arg::new("settled")
                                .long("settled")
                                .action(ArgAction::SetTrue)
                                .help("Mark the (first) occurrence as settled"),
                        )
                        .arg(Arg::new("note").long("note"))
                        .arg(
                            Arg::new("recurring")
                                .long("recurring")
                                .action(ArgAction::SetTrue)
                                .help("Repeat at --frequency until --through"),
                        )
                        .arg(
                            Arg::new("installments")
                                .long("installments")
                                .conflicts_with("recurring")
                                .help("Split into N installments at --frequency"),
                        )
                        .arg(
                            Arg::new("frequency")
                                .long("frequency")
                                .value_parser(["weekly", "biweekly", "monthly", "annual"])
                                .default_value("monthly"),
                        )
                        .arg(
                            Arg::new("through")
                                .long("through")
                                .help("Materialize recurring occurrences through this date"),
                        ),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(Arg::new("month").long("month"))
                        .arg(Arg::new("account").long("account"))
                        .arg(Arg::new("card").long("card"))
                        .arg(
                            Arg::new("invoice")
                                .long("invoice")
                                .help("Only card entries on this invoice due date"),
                        ),
                ))
                .subcommand(
                    Command::new("edit")
                        .arg(Arg::new("id").required(true))
                        .arg(Arg::new("amount").long("amount"))
                        .arg(Arg::new("date").long("date"))
                        .arg(Arg::new("description").long("description"))
                        .arg(
                            Arg::new("scope")
                                .long("scope")
                                .value_parser(["current", "future"])
                                .default_value("current")
                                .help("How far the change reaches across a series"),
                        ),
                )
                .subcommand(
                    Command::new("rm")
                        .arg(Arg::new("id").required(true))
                        .arg(
                            Arg::new("scope")
                                .long("scope")
                                .value_parser(["current", "future"])
                                .default_value("current"),
                        ),
                ),
        )
        .subcommand(
            Command::new("series")
                .about("Manage generated series")
                .subcommand(
                    Command::new("extend")
                        .arg(Arg::new("id").long("id").required(true))
                        .arg(Arg::new("through").long("through").required(true)),
                ),
        )
        .subcommand(
            Command::new("invoice")
                .about("Card billing cycles")
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(Arg::new("card").long("card").required(true))
                        .arg(
                            Arg::new("reference")
                                .long("reference")
                                .help("Center the cycle window on this date (default today)"),
                        ),
                )),
        )
        .subcommand(
            Command::new("import")
                .about("Import bank/card statements")
                .subcommand(
                    Command::new("statement")
                        .arg(Arg::new("path").long("path").required(true))
                        .arg(Arg::new("account").long("account"))
                        .arg(Arg::new("card").long("card"))
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .help("Fallback category for records no rule matches"),
                        )
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .value_parser(["auto", "delimited", "csv", "ofx", "text"])
                                .default_value("auto"),
                        )
                        .arg(
                            Arg::new("dry-run")
                                .long("dry-run")
                                .action(ArgAction::SetTrue)
                                .help("Report what would be imported without writing"),
                        ),
                ),
        )
        .subcommand(
            Command::new("rules")
                .about("Categorization rules applied to imported descriptions")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("pattern").long("pattern").required(true))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("rewrite").long("rewrite")),
                )
                .subcommand(Command::new("list"))
                .subcommand(Command::new("rm").arg(Arg::new("id").long("id").required(true))),
        )
        .subcommand(
            Command::new("config")
                .about("Engine settings")
                .subcommand(Command::new("get").arg(Arg::new("key").required(true)))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                ),
        )
}
