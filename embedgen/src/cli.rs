use clap;

pub fn app<'a, 'b>() -> clap::App<'a, 'b> {
    clap::App::new("embedgen")
        .version(clap::crate_version!())
        .author(clap::crate_authors!())
        .about("Packs directory trees into per-platform bundles for embedfs")
        .arg(clap::Arg::from_usage("-d --debug 'Enable debug output'"))
        .arg(clap::Arg::from_usage(
            "--gzip 'Gzip file contents (images, audio, video and archives are stored as is)'",
        ))
        .arg(
            clap::Arg::from_usage("-o, --output [dir] 'Directory the bundles are written to'")
                .default_value("."),
        )
        .arg(
            clap::Arg::from_usage("-n, --name [name] 'Base name of the generated files'")
                .default_value("bundle"),
        )
        .arg(
            clap::Arg::from_usage(
                "-i, --include [include]... 'PATH:DECLARING_FILE, the platform suffix of DECLARING_FILE picks the bundle'",
            )
            .number_of_values(1),
        )
        .arg(
            clap::Arg::from_usage(
                "--include-file [include-file]... 'LIST:DECLARING_FILE, LIST holds one include path per line'",
            )
            .number_of_values(1),
        )
}

pub fn parse_flags<'a>() -> clap::ArgMatches<'a> {
    app().get_matches()
}
