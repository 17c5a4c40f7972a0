//! Encode profile building: source video + ladder -> transcode jobs.
//!
//! [`EncodeProfileBuilder`] is pure. It resolves output paths and the full
//! ffmpeg argument vector for every job but never touches the filesystem or
//! spawns anything, so identical inputs always yield identical jobs.
//!
//! Output layout:
//!
//! - cpu: `<out>/<course>/<stem>_<label>.m3u8` and
//!   `<out>/<course>/<stem>_<label>_%03d.<ext>`, one job per rung.
//! - gpu fan-out: `<out>/<course>/<stem>/stream_<label>/playlist.m3u8`,
//!   `.../stream_<label>/data%03d.<ext>` and `<out>/<course>/<stem>/master.m3u8`,
//!   one job for the whole ladder.

use std::path::{Path, PathBuf};

use lf_core::config::EncodeConfig;
use lf_core::{
    Course, EncodeCommand, JobId, JobTarget, LadderMode, RenditionLadder, RenditionSpec,
    SourceVideo, TranscodeJob,
};

/// Master playlist file name for fan-out jobs.
pub const MASTER_PLAYLIST: &str = "master.m3u8";

/// Per-rung playlist file name for fan-out jobs.
pub const STREAM_PLAYLIST: &str = "playlist.m3u8";

/// Builds [`TranscodeJob`]s for one ladder and one set of encoder settings.
#[derive(Debug, Clone)]
pub struct EncodeProfileBuilder {
    program: PathBuf,
    ladder: RenditionLadder,
    settings: EncodeConfig,
}

impl EncodeProfileBuilder {
    pub fn new(program: PathBuf, ladder: RenditionLadder, settings: EncodeConfig) -> Self {
        Self {
            program,
            ladder,
            settings,
        }
    }

    pub fn ladder(&self) -> &RenditionLadder {
        &self.ladder
    }

    /// All jobs for one source video, in ladder order.
    pub fn build(&self, course: &Course, source: &SourceVideo) -> Vec<TranscodeJob> {
        match self.ladder.mode() {
            LadderMode::Cpu => self
                .ladder
                .rungs()
                .iter()
                .map(|rung| self.rendition_job(course, source, rung))
                .collect(),
            LadderMode::GpuFanOut => vec![self.fan_out_job(course, source)],
        }
    }

    fn segment_type(&self) -> &'static str {
        match self.settings.segment_extension.as_str() {
            "m4s" | "mp4" => "fmp4",
            _ => "mpegts",
        }
    }

    // -- cpu ----------------------------------------------------------------

    fn rendition_job(
        &self,
        course: &Course,
        source: &SourceVideo,
        rung: &RenditionSpec,
    ) -> TranscodeJob {
        let s = &self.settings;
        let base = format!("{}_{}", source.stem, rung.label);
        let playlist = course.output_dir.join(format!("{base}.m3u8"));
        let segments = course
            .output_dir
            .join(format!("{base}_%03d.{}", s.segment_extension));

        let mut cmd = EncodeCommand::new(self.program.clone());
        let args = &mut cmd.args;
        push(args, &["-y", "-i"]);
        args.push(path_arg(&source.path));
        push(args, &["-c:v", &s.cpu_codec, "-preset", &s.cpu_preset]);
        push(args, &["-profile:v", &rung.profile, "-level:v", &rung.level]);
        push(args, &["-b:v", &rung.video_bitrate]);
        push(args, &["-s", &rung.resolution.to_string()]);
        push(args, &["-c:a", &s.audio_codec, "-b:a", &rung.audio_bitrate]);
        push(args, &["-ac", &s.audio_channels.to_string()]);
        let gop = s.gop_size.to_string();
        push(args, &["-g", &gop, "-keyint_min", &gop, "-sc_threshold", "0"]);
        push(
            args,
            &[
                "-force_key_frames",
                &format!("expr:gte(t,n_forced*{})", s.keyframe_interval),
            ],
        );
        push(args, &["-f", "hls"]);
        push(args, &["-hls_time", &s.segment_duration().to_string()]);
        push(args, &["-hls_list_size", "0"]);
        push(args, &["-hls_flags", "independent_segments"]);
        push(args, &["-hls_segment_type", self.segment_type()]);
        args.push("-hls_segment_filename".into());
        args.push(path_arg(&segments));
        args.push(path_arg(&playlist));

        TranscodeJob {
            id: JobId::for_rendition(source, &rung.label),
            source: source.clone(),
            target: JobTarget::Rendition { rung: rung.clone() },
            output_dir: course.output_dir.clone(),
            playlists: vec![playlist],
            master_playlist: None,
            required_dirs: vec![course.output_dir.clone()],
            command: cmd,
        }
    }

    // -- gpu fan-out --------------------------------------------------------

    fn fan_out_job(&self, course: &Course, source: &SourceVideo) -> TranscodeJob {
        let s = &self.settings;
        let rungs = self.ladder.rungs();
        let output_dir = course.output_dir.join(&source.stem);
        let stream_dirs: Vec<PathBuf> = rungs
            .iter()
            .map(|r| output_dir.join(format!("stream_{}", r.label)))
            .collect();
        let playlists: Vec<PathBuf> = stream_dirs.iter().map(|d| d.join(STREAM_PLAYLIST)).collect();

        let mut cmd = EncodeCommand::new(self.program.clone());
        let args = &mut cmd.args;
        args.push("-y".into());
        // CUDA frames stay on the GPU and need the matching scaler; other
        // decoders hand frames back in system memory.
        let scaler = match s.hwaccel() {
            Some("cuda") => {
                push(args, &["-hwaccel", "cuda", "-hwaccel_output_format", "cuda"]);
                "scale_cuda"
            }
            Some(hw) => {
                push(args, &["-hwaccel", hw]);
                "scale"
            }
            None => "scale",
        };
        args.push("-i".into());
        args.push(path_arg(&source.path));
        push(args, &["-filter_complex", &split_filter(rungs, scaler)]);

        for (i, rung) in rungs.iter().enumerate() {
            push(args, &["-map", &format!("[v{i}out]")]);
            push(args, &[&format!("-c:v:{i}"), &s.gpu_codec]);
            push(args, &[&format!("-preset:v:{i}"), &s.gpu_preset]);
            push(args, &[&format!("-profile:v:{i}"), &rung.profile]);
            push(args, &[&format!("-level:v:{i}"), &rung.level]);
            push(args, &[&format!("-b:v:{i}"), &rung.video_bitrate]);
            if let Some(maxrate) = &rung.maxrate {
                push(args, &[&format!("-maxrate:v:{i}"), maxrate]);
            }
            if let Some(bufsize) = &rung.bufsize {
                push(args, &[&format!("-bufsize:v:{i}"), bufsize]);
            }
        }
        for (i, rung) in rungs.iter().enumerate() {
            push(args, &["-map", "0:a:0"]);
            push(args, &[&format!("-c:a:{i}"), &s.audio_codec]);
            push(args, &[&format!("-b:a:{i}"), &rung.audio_bitrate]);
            push(args, &[&format!("-ac:a:{i}"), &s.audio_channels.to_string()]);
        }

        push(args, &["-f", "hls"]);
        push(args, &["-hls_time", &s.segment_duration().to_string()]);
        push(args, &["-hls_playlist_type", "vod"]);
        push(args, &["-hls_flags", "independent_segments"]);
        push(args, &["-hls_segment_type", self.segment_type()]);
        args.push("-hls_segment_filename".into());
        args.push(path_arg(
            &output_dir
                .join("stream_%v")
                .join(format!("data%03d.{}", s.segment_extension)),
        ));
        push(args, &["-master_pl_name", MASTER_PLAYLIST]);
        push(args, &["-var_stream_map", &variant_stream_map(rungs)]);
        args.push(path_arg(&output_dir.join("stream_%v").join(STREAM_PLAYLIST)));

        TranscodeJob {
            id: JobId::for_fan_out(source),
            source: source.clone(),
            target: JobTarget::FanOut {
                rungs: rungs.to_vec(),
            },
            master_playlist: Some(output_dir.join(MASTER_PLAYLIST)),
            output_dir,
            playlists,
            required_dirs: stream_dirs,
            command: cmd,
        }
    }
}

/// `[0:v]split=N[v0][v1]...;[v0]<scaler>=w=W:h=H[v0out];...`
fn split_filter(rungs: &[RenditionSpec], scaler: &str) -> String {
    let outputs: String = (0..rungs.len()).map(|i| format!("[v{i}]")).collect();
    let mut graph = format!("[0:v]split={}{}", rungs.len(), outputs);
    for (i, rung) in rungs.iter().enumerate() {
        graph.push_str(&format!(
            ";[v{i}]{scaler}=w={}:h={}[v{i}out]",
            rung.resolution.width, rung.resolution.height
        ));
    }
    graph
}

/// Pairs video rung `i` with audio rung `i` and names the variant by label,
/// so `stream_%v` expands to `stream_<label>`.
pub fn variant_stream_map(rungs: &[RenditionSpec]) -> String {
    rungs
        .iter()
        .enumerate()
        .map(|(i, r)| format!("v:{i},a:{i},name:{}", r.label))
        .collect::<Vec<_>>()
        .join(" ")
}

fn push(args: &mut Vec<String>, items: &[&str]) {
    args.extend(items.iter().map(|s| s.to_string()));
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_core::Resolution;

    fn course() -> Course {
        Course::new(
            "algebra",
            PathBuf::from("input/algebra"),
            PathBuf::from("output/algebra"),
        )
    }

    fn intro() -> SourceVideo {
        SourceVideo {
            course: "algebra".into(),
            file_name: "intro.mp4".into(),
            stem: "intro".into(),
            path: PathBuf::from("input/algebra/intro.mp4"),
        }
    }

    fn builder(ladder: RenditionLadder) -> EncodeProfileBuilder {
        let mut settings = EncodeConfig::default();
        settings.mode = ladder.mode();
        EncodeProfileBuilder::new(PathBuf::from("ffmpeg"), ladder, settings)
    }

    fn arg_after<'a>(args: &'a [String], flag: &str) -> &'a str {
        let pos = args
            .iter()
            .position(|a| a == flag)
            .unwrap_or_else(|| panic!("missing {flag}"));
        &args[pos + 1]
    }

    #[test]
    fn cpu_ladder_yields_one_job_per_rung() {
        let jobs = builder(RenditionLadder::cpu_default()).build(&course(), &intro());
        assert_eq!(jobs.len(), 3);
        let playlists: Vec<PathBuf> = jobs.iter().map(|j| j.playlists[0].clone()).collect();
        assert_eq!(
            playlists,
            [
                PathBuf::from("output/algebra/intro_720p.m3u8"),
                PathBuf::from("output/algebra/intro_1080p.m3u8"),
                PathBuf::from("output/algebra/intro_2160p.m3u8"),
            ]
        );
        for job in &jobs {
            assert_eq!(job.required_dirs, [PathBuf::from("output/algebra")]);
            assert!(job.master_playlist.is_none());
        }
    }

    #[test]
    fn cpu_command_carries_rung_parameters() {
        let jobs = builder(RenditionLadder::cpu_default()).build(&course(), &intro());
        let args = &jobs[2].command.args;
        assert_eq!(arg_after(args, "-i"), "input/algebra/intro.mp4");
        assert_eq!(arg_after(args, "-s"), "3840x2160");
        assert_eq!(arg_after(args, "-b:v"), "8000k");
        assert_eq!(arg_after(args, "-profile:v"), "high");
        assert_eq!(arg_after(args, "-level:v"), "5.1");
        assert_eq!(arg_after(args, "-g"), "4");
        assert_eq!(arg_after(args, "-keyint_min"), "4");
        assert_eq!(arg_after(args, "-force_key_frames"), "expr:gte(t,n_forced*4)");
        assert_eq!(arg_after(args, "-hls_time"), "4");
        assert_eq!(
            arg_after(args, "-hls_segment_filename"),
            "output/algebra/intro_2160p_%03d.ts"
        );
        assert_eq!(args.last().unwrap(), "output/algebra/intro_2160p.m3u8");

        let low = &jobs[0].command.args;
        assert_eq!(arg_after(low, "-profile:v"), "main");
        assert_eq!(arg_after(low, "-level:v"), "3.1");
    }

    #[test]
    fn cpu_jobs_have_distinct_ids() {
        let jobs = builder(RenditionLadder::cpu_default()).build(&course(), &intro());
        let ids: Vec<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, ["algebra/intro@720p", "algebra/intro@1080p", "algebra/intro@2160p"]);
    }

    #[test]
    fn gpu_ladder_yields_single_fan_out_job() {
        let jobs = builder(RenditionLadder::gpu_default()).build(&course(), &intro());
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.output_dir, PathBuf::from("output/algebra/intro"));
        assert_eq!(
            job.master_playlist,
            Some(PathBuf::from("output/algebra/intro/master.m3u8"))
        );
        assert_eq!(
            job.playlists,
            [
                PathBuf::from("output/algebra/intro/stream_1080p/playlist.m3u8"),
                PathBuf::from("output/algebra/intro/stream_720p/playlist.m3u8"),
                PathBuf::from("output/algebra/intro/stream_480p/playlist.m3u8"),
            ]
        );
        assert_eq!(job.required_dirs.len(), 3);
        assert!(job
            .required_dirs
            .iter()
            .all(|d| d.starts_with("output/algebra/intro")));
    }

    #[test]
    fn gpu_command_maps_every_rung() {
        let jobs = builder(RenditionLadder::gpu_default()).build(&course(), &intro());
        let args = &jobs[0].command.args;
        assert_eq!(arg_after(args, "-hwaccel"), "cuda");
        assert_eq!(arg_after(args, "-hwaccel_output_format"), "cuda");
        assert_eq!(
            arg_after(args, "-filter_complex"),
            "[0:v]split=3[v0][v1][v2];[v0]scale_cuda=w=1920:h=1080[v0out];\
             [v1]scale_cuda=w=1280:h=720[v1out];[v2]scale_cuda=w=854:h=480[v2out]"
        );
        assert_eq!(
            arg_after(args, "-var_stream_map"),
            "v:0,a:0,name:1080p v:1,a:1,name:720p v:2,a:2,name:480p"
        );
        assert_eq!(arg_after(args, "-maxrate:v:1"), "2996k");
        assert_eq!(arg_after(args, "-bufsize:v:2"), "2100k");
        assert_eq!(arg_after(args, "-b:a:0"), "192k");
        assert_eq!(arg_after(args, "-hls_time"), "10");
        assert_eq!(arg_after(args, "-master_pl_name"), "master.m3u8");
        assert_eq!(
            arg_after(args, "-hls_segment_filename"),
            "output/algebra/intro/stream_%v/data%03d.ts"
        );
        assert_eq!(
            args.last().unwrap(),
            "output/algebra/intro/stream_%v/playlist.m3u8"
        );
        assert_eq!(args.iter().filter(|a| *a == "0:a:0").count(), 3);
    }

    #[test]
    fn gpu_without_rate_control_omits_flags() {
        let ladder = RenditionLadder::new(
            LadderMode::GpuFanOut,
            vec![RenditionSpec::new("720p", Resolution::new(1280, 720), "2800k", "128k")],
        )
        .unwrap();
        let mut settings = EncodeConfig::default();
        settings.mode = LadderMode::GpuFanOut;
        settings.hwaccel = Some("none".into());
        let jobs = EncodeProfileBuilder::new(PathBuf::from("ffmpeg"), ladder, settings)
            .build(&course(), &intro());
        let args = &jobs[0].command.args;
        assert!(!args.iter().any(|a| a.starts_with("-maxrate")));
        assert!(!args.iter().any(|a| a == "-hwaccel"));
        assert_eq!(
            arg_after(args, "-filter_complex"),
            "[0:v]split=1[v0];[v0]scale=w=1280:h=720[v0out]"
        );
    }

    #[test]
    fn non_cuda_hwaccel_decodes_to_system_memory() {
        let mut settings = EncodeConfig::default();
        settings.mode = LadderMode::GpuFanOut;
        settings.hwaccel = Some("vaapi".into());
        let jobs = EncodeProfileBuilder::new(
            PathBuf::from("ffmpeg"),
            RenditionLadder::gpu_default(),
            settings,
        )
        .build(&course(), &intro());
        let args = &jobs[0].command.args;
        assert_eq!(arg_after(args, "-hwaccel"), "vaapi");
        assert!(!args.iter().any(|a| a == "-hwaccel_output_format"));
        assert!(!arg_after(args, "-filter_complex").contains("scale_cuda"));
    }

    #[test]
    fn builder_is_deterministic() {
        for ladder in [RenditionLadder::cpu_default(), RenditionLadder::gpu_default()] {
            let b = builder(ladder);
            assert_eq!(b.build(&course(), &intro()), b.build(&course(), &intro()));
        }
    }

    #[test]
    fn paths_with_spaces_stay_single_arguments() {
        let course = Course::new(
            "linear algebra",
            PathBuf::from("in/linear algebra"),
            PathBuf::from("out/linear algebra"),
        );
        let source = SourceVideo {
            course: "linear algebra".into(),
            file_name: "week 1.mp4".into(),
            stem: "week 1".into(),
            path: PathBuf::from("in/linear algebra/week 1.mp4"),
        };
        let jobs = builder(RenditionLadder::cpu_default()).build(&course, &source);
        assert_eq!(
            jobs[0].command.args.last().unwrap(),
            "out/linear algebra/week 1_720p.m3u8"
        );
    }

    #[test]
    fn fmp4_segments_switch_segment_type() {
        let mut settings = EncodeConfig::default();
        settings.segment_extension = "m4s".into();
        let jobs = EncodeProfileBuilder::new(
            PathBuf::from("ffmpeg"),
            RenditionLadder::cpu_default(),
            settings,
        )
        .build(&course(), &intro());
        assert_eq!(arg_after(&jobs[0].command.args, "-hls_segment_type"), "fmp4");
    }
}
