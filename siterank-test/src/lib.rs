// Integration test utilities and fixture corpora for siterank.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context;

use siterank_core::config::{ContributionMode, SiteRankConfig};
use siterank_core::io::site_key;
use siterank_core::pipeline::{PipelineResult, SiteRankPipeline};
use siterank_core::progress::NoopReporter;

/// A set of input record files in a temporary directory.
#[derive(Debug)]
pub struct TestCorpus {
    pub dir: tempfile::TempDir,
    has_display_urls: bool,
}

impl TestCorpus {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes raw record files. `display_urls` may be `None`.
    pub fn from_records(assignments: &str, edges: &str, display_urls: Option<&str>) -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        let input = dir.path().join("input");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(input.join("idToSitename.txt"), assignments).unwrap();
        std::fs::write(input.join("edges.txt"), edges).unwrap();
        if let Some(urls) = display_urls {
            std::fs::write(input.join("idToSite.txt"), urls).unwrap();
        }
        Self {
            dir,
            has_display_urls: display_urls.is_some(),
        }
    }

    /// One document per site and one document link per pair.
    pub fn sites(sites: &[&str], links: &[(&str, &str)]) -> Self {
        let mut assignments = String::new();
        for (doc, site) in sites.iter().enumerate() {
            writeln!(assignments, "{doc},{site}").unwrap();
        }
        let doc_of = |name: &str| {
            sites
                .iter()
                .position(|s| *s == name)
                .unwrap_or_else(|| panic!("unknown fixture site {name}"))
        };
        let mut edges = String::new();
        for &(src, dst) in links {
            writeln!(edges, "{}\t{}", doc_of(src), doc_of(dst)).unwrap();
        }
        Self::from_records(&assignments, &edges, None)
    }

    /// Three leaf sites linking into one hub that links nowhere.
    pub fn star() -> Self {
        Self::sites(
            &["hub", "leaf1", "leaf2", "leaf3"],
            &[("leaf1", "hub"), ("leaf2", "hub"), ("leaf3", "hub")],
        )
    }

    /// `a` links to `b` from three documents and to `c` from one; both link back.
    pub fn uneven_links() -> Self {
        Self::from_records(
            "1,a\n2,a\n3,a\n4,b\n5,c\n",
            "1\t4\n2\t4\n3\t4\n3\t5\n4\t1\n5\t2\n",
            None,
        )
    }

    /// A small crawl keyed from URLs, with the usual defects of real input:
    /// a duplicate assignment, unresolved and same-site links, and a display
    /// url for a document that was never assigned.
    pub fn crawl_sample() -> Self {
        let urls = [
            (1, "http://www.alpha.com/index.html"),
            (2, "http://www.alpha.com/about.html"),
            (3, "http://www.beta.org/"),
            (4, "http://www.beta.org/news/1"),
            (5, "https://portal.example/view?siteid={GAMMA}&page=1"),
            (6, "https://portal.example/view?siteid={OLD}&next=x?siteid={GAMMA}"),
            (7, "http://lonely.net/"),
        ];

        let mut assignments = String::new();
        for (doc, url) in urls {
            let key = site_key(url).expect("fixture url has a site key");
            writeln!(assignments, "{doc},{key}").unwrap();
        }
        assignments.push_str("1,httpwww.beta.org\r\n\n");

        let edges = "1\t3\n2\t3\n2\t4\n3\t5\n5\t1\n6\t1\n1\t2\n4\t99\n98\t1\n";

        let mut display = String::new();
        for (doc, url) in urls.iter().filter(|(doc, _)| [1, 3, 5, 7].contains(doc)) {
            writeln!(display, "{doc}\t{url}").unwrap();
        }
        display.push_str("42\thttp://ghost.example/\n");

        Self::from_records(&assignments, edges, Some(&display))
    }

    /// Config pointing at this corpus, writing into `<dir>/output`.
    pub fn config(&self) -> SiteRankConfig {
        let mut config = SiteRankConfig::default();
        let root = self.path();
        config.input.assignments = root.join("input/idToSitename.txt");
        config.input.edges = root.join("input/edges.txt");
        config.input.display_urls = self
            .has_display_urls
            .then(|| root.join("input/idToSite.txt"));
        config.output.ranks = root.join("output/idToSiterank.txt");
        config.output.root_ranks = root.join("output/rootIdToSiterank.txt");
        config
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.path().join("output").join(name)
    }

    /// Parses `idToSiterank.txt` into doc id → rank.
    pub fn read_document_ranks(&self) -> anyhow::Result<HashMap<i64, f64>> {
        let path = self.output_path("idToSiterank.txt");
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        content
            .lines()
            .map(|line| -> anyhow::Result<(i64, f64)> {
                let (doc, rank) = line
                    .split_once(", ")
                    .with_context(|| format!("Bad rank line: {line}"))?;
                Ok((doc.parse()?, rank.parse()?))
            })
            .collect()
    }

    /// Lines of `rootIdToSiterank.txt`, split into fields.
    pub fn read_root_records(&self) -> anyhow::Result<Vec<Vec<String>>> {
        let path = self.output_path("rootIdToSiterank.txt");
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        Ok(content
            .lines()
            .map(|line| line.split(", ").map(str::to_string).collect())
            .collect())
    }
}

/// Runs the full pipeline over `corpus` with its default config.
pub fn run_pipeline(corpus: &TestCorpus) -> PipelineResult {
    run_pipeline_with(corpus, |_| {})
}

/// Runs the full pipeline after `adjust` has edited the config.
pub fn run_pipeline_with(
    corpus: &TestCorpus,
    adjust: impl FnOnce(&mut SiteRankConfig),
) -> PipelineResult {
    let mut config = corpus.config();
    adjust(&mut config);
    SiteRankPipeline::new(&config)
        .run(&NoopReporter)
        .expect("pipeline should succeed")
}

/// Runs the pipeline in document-weighted mode.
pub fn run_weighted(corpus: &TestCorpus) -> PipelineResult {
    run_pipeline_with(corpus, |c| c.solver.mode = ContributionMode::DocumentWeighted)
}
