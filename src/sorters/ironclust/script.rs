// IronClust invocation builder
// Renders argfile.txt, the MATLAB entry script and the OS-specific launcher

use std::path::{Path, PathBuf};

use crate::params::{format_float, ParamSet, ParamTable};
use crate::shell::{absolute_path, HostOs};

pub const DATASET_DIR: &str = "ironclust_dataset";
pub const TMP_DIR: &str = "tmp";
pub const MATLAB_SCRIPT_NAME: &str = "run_ironclust";

/// Every path the generated scripts refer to
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationPaths {
    pub source_dir: PathBuf,
    pub ironclust_path: PathBuf,
    pub dataset_dir: PathBuf,
    pub tmp_dir: PathBuf,
}

impl InvocationPaths {
    /// Layout under `output_folder`, made absolute since the tool runs from `tmp/`
    pub fn new(output_folder: &Path, source_dir: &Path, ironclust_path: &Path) -> Self {
        let output_folder = absolute_path(output_folder);
        InvocationPaths {
            source_dir: source_dir.to_path_buf(),
            ironclust_path: ironclust_path.to_path_buf(),
            dataset_dir: output_folder.join(DATASET_DIR),
            tmp_dir: output_folder.join(TMP_DIR),
        }
    }

    pub fn raw_path(&self) -> PathBuf {
        self.dataset_dir.join("raw.mda")
    }

    pub fn geom_path(&self) -> PathBuf {
        self.dataset_dir.join("geom.csv")
    }

    pub fn argfile_path(&self) -> PathBuf {
        self.dataset_dir.join("argfile.txt")
    }

    pub fn firings_path(&self) -> PathBuf {
        self.tmp_dir.join("firings.mda")
    }

    pub fn samplerate_path(&self) -> PathBuf {
        self.tmp_dir.join("samplerate.txt")
    }

    pub fn matlab_script_path(&self) -> PathBuf {
        self.tmp_dir.join(format!("{}.m", MATLAB_SCRIPT_NAME))
    }

    pub fn launcher_path(&self, host: HostOs) -> PathBuf {
        self.tmp_dir
            .join(format!("{}{}", super::SORTER_NAME, host.script_extension()))
    }
}

/// Generated file contents for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationScripts {
    pub argfile: String,
    pub matlab: String,
    pub shell: String,
}

/// One `key=value` line per parameter, then the sampling rate
pub fn render_argfile(params: &ParamSet, samplerate: f64) -> String {
    let mut text = String::new();
    for (key, value) in params.iter() {
        text.push_str(&format!("{}={}\n", key, value));
    }
    text.push_str(&format!("samplerate={}\n", format_float(samplerate)));
    text
}

/// Parse argfile text back into parameters (the samplerate line included)
///
/// Values are typed by `table`, so string parameters stay strings even when
/// they read like numbers or booleans.
pub fn parse_argfile(text: &str, table: &ParamTable) -> ParamSet {
    text.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let key = key.trim();
            (key.to_string(), table.parse_value(key, value))
        })
        .collect()
}

/// MATLAB single-quoted string literal contents
fn matlab_str(path: &Path) -> String {
    path.display().to_string().replace('\'', "''")
}

pub fn render_matlab_script(paths: &InvocationPaths) -> String {
    let install = matlab_str(&paths.ironclust_path);
    let install_matlab = matlab_str(&paths.ironclust_path.join("matlab"));
    let install_mdaio = matlab_str(&paths.ironclust_path.join("matlab").join("mdaio"));

    format!(
        "addpath('{source}');\n\
         addpath('{install}', '{install_matlab}', '{install_mdaio}');\n\
         try\n\
         \x20   p_ironclust('{tmp}', '{raw}', '{geom}', '', '', '{firings}', '{argfile}');\n\
         catch\n\
         \x20   fprintf('----------------------------------------');\n\
         \x20   fprintf(lasterr());\n\
         \x20   quit(1);\n\
         end\n\
         quit(0);\n",
        source = matlab_str(&paths.source_dir),
        install = install,
        install_matlab = install_matlab,
        install_mdaio = install_mdaio,
        tmp = matlab_str(&paths.tmp_dir),
        raw = matlab_str(&paths.raw_path()),
        geom = matlab_str(&paths.geom_path()),
        firings = matlab_str(&paths.firings_path()),
        argfile = matlab_str(&paths.argfile_path()),
    )
}

pub fn render_shell_script(host: HostOs, tmp_dir: &Path, matlab_command: &str) -> String {
    match host {
        HostOs::Windows => format!(
            "cd /d \"{tmp}\"\n{matlab} -nosplash -nodisplay -wait -r {script}\n",
            tmp = tmp_dir.display(),
            matlab = matlab_command,
            script = MATLAB_SCRIPT_NAME,
        ),
        HostOs::Posix => format!(
            "#!/bin/bash\ncd \"{tmp}\"\n\"{matlab}\" -nosplash -nodisplay -r {script}\n",
            tmp = tmp_dir.display(),
            matlab = matlab_command,
            script = MATLAB_SCRIPT_NAME,
        ),
    }
}

/// Render all three files; a pure function of its arguments
pub fn build_command(
    params: &ParamSet,
    samplerate: f64,
    paths: &InvocationPaths,
    host: HostOs,
    matlab_command: &str,
) -> InvocationScripts {
    InvocationScripts {
        argfile: render_argfile(params, samplerate),
        matlab: render_matlab_script(paths),
        shell: render_shell_script(host, &paths.tmp_dir, matlab_command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;
    use crate::sorters::ironclust::params::IRONCLUST_PARAMS;

    fn paths() -> InvocationPaths {
        InvocationPaths::new(
            Path::new("/runs/r1"),
            Path::new("/src/adapter"),
            Path::new("/opt/ironclust"),
        )
    }

    #[test]
    fn test_argfile_lines() {
        let params = ParamSet::new()
            .with("detect_sign", -1)
            .with("whiten", false)
            .with("filter_type", "bandpass");
        let text = render_argfile(&params, 30000.0);

        assert_eq!(
            text,
            "detect_sign=-1\nwhiten=False\nfilter_type=bandpass\nsamplerate=30000.0\n"
        );
    }

    #[test]
    fn test_argfile_round_trip_of_defaults() {
        let defaults = IRONCLUST_PARAMS.defaults();
        let text = render_argfile(&defaults, 30000.0);
        assert_eq!(text.lines().count(), defaults.len() + 1);

        let parsed = parse_argfile(&text, &IRONCLUST_PARAMS);
        assert_eq!(parsed.get("samplerate"), Some(&ParamValue::Float(30000.0)));

        let without_rate: ParamSet = parsed
            .iter()
            .filter(|(k, _)| *k != "samplerate")
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        assert_eq!(without_rate, defaults);
    }

    #[test]
    fn test_numeric_looking_strings_round_trip() {
        let params = IRONCLUST_PARAMS
            .merge(
                &ParamSet::new()
                    .with("prm_template_name", "5")
                    .with("feature_type", "True"),
            )
            .unwrap();
        let parsed = parse_argfile(&render_argfile(&params, 30000.0), &IRONCLUST_PARAMS);

        assert_eq!(
            parsed.get("prm_template_name"),
            Some(&ParamValue::Str("5".to_string()))
        );
        assert_eq!(
            parsed.get("feature_type"),
            Some(&ParamValue::Str("True".to_string()))
        );
    }

    #[test]
    fn test_matlab_script_calls_entry_point() {
        let script = render_matlab_script(&paths());

        assert!(script.starts_with("addpath('/src/adapter');\n"));
        assert!(script.contains(
            "addpath('/opt/ironclust', '/opt/ironclust/matlab', '/opt/ironclust/matlab/mdaio');"
        ));
        assert!(script.contains(
            "    p_ironclust('/runs/r1/tmp', '/runs/r1/ironclust_dataset/raw.mda', \
             '/runs/r1/ironclust_dataset/geom.csv', '', '', '/runs/r1/tmp/firings.mda', \
             '/runs/r1/ironclust_dataset/argfile.txt');\n"
        ));
        assert!(script.contains("    quit(1);\n"));
        assert!(script.ends_with("end\nquit(0);\n"));
    }

    #[test]
    fn test_matlab_quotes_are_escaped() {
        let p = InvocationPaths::new(
            Path::new("/runs/o'brien"),
            Path::new("/src"),
            Path::new("/opt/ironclust"),
        );
        assert!(render_matlab_script(&p).contains("'/runs/o''brien/tmp'"));
    }

    #[test]
    fn test_shell_templates() {
        let tmp = Path::new("/runs/r1/tmp");

        let posix = render_shell_script(HostOs::Posix, tmp, "matlab");
        assert_eq!(
            posix,
            "#!/bin/bash\ncd \"/runs/r1/tmp\"\n\"matlab\" -nosplash -nodisplay -r run_ironclust\n"
        );

        let windows = render_shell_script(HostOs::Windows, tmp, "matlab");
        assert!(windows.starts_with("cd /d \"/runs/r1/tmp\"\n"));

        let spaced = render_shell_script(HostOs::Windows, Path::new("D:/my runs/tmp"), "matlab");
        assert!(spaced.starts_with("cd /d \"D:/my runs/tmp\"\n"));
        assert!(windows.contains("-nosplash -nodisplay -wait -r run_ironclust"));
    }

    #[test]
    fn test_build_command_is_deterministic() {
        let params = IRONCLUST_PARAMS.defaults();
        let a = build_command(&params, 30000.0, &paths(), HostOs::Posix, "matlab");
        let b = build_command(&params, 30000.0, &paths(), HostOs::Posix, "matlab");
        assert_eq!(a, b);

        let c = build_command(&params, 30000.0, &paths(), HostOs::Windows, "matlab");
        assert_eq!(a.matlab, c.matlab);
        assert_ne!(a.shell, c.shell);
    }

    #[test]
    fn test_relative_output_folder_is_absolute() {
        let p = InvocationPaths::new(Path::new("runs/r2"), Path::new("/src"), Path::new("/opt/ic"));
        assert!(p.tmp_dir.is_absolute());
        assert!(p.dataset_dir.is_absolute());
        assert!(p.tmp_dir.ends_with("runs/r2/tmp"));

        let script = render_matlab_script(&p);
        assert!(!script.contains("'runs/r2/tmp'"));
    }

    #[test]
    fn test_layout_paths() {
        let p = paths();
        assert_eq!(p.matlab_script_path(), PathBuf::from("/runs/r1/tmp/run_ironclust.m"));
        assert_eq!(p.launcher_path(HostOs::Posix), PathBuf::from("/runs/r1/tmp/ironclust"));
        assert_eq!(
            p.launcher_path(HostOs::Windows),
            PathBuf::from("/runs/r1/tmp/ironclust.bat")
        );
        assert_eq!(p.samplerate_path(), PathBuf::from("/runs/r1/tmp/samplerate.txt"));
    }
}
