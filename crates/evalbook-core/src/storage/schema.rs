/// Current layout version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 3;

pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS models (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  notes_json TEXT NOT NULL DEFAULT '""',
  is_example INTEGER NOT NULL DEFAULT 0,
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS problem_sets (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  notes_json TEXT NOT NULL DEFAULT '""',
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS problems (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  problem_set_id INTEGER NOT NULL REFERENCES problem_sets(id),
  input TEXT NOT NULL DEFAULT '',
  ideal TEXT NOT NULL DEFAULT '',
  rubric TEXT NOT NULL DEFAULT '',
  notes_json TEXT NOT NULL DEFAULT '""',
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS submission_sets (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  model_id INTEGER NOT NULL REFERENCES models(id),
  name TEXT NOT NULL,
  notes_json TEXT NOT NULL DEFAULT '""',
  is_example INTEGER NOT NULL DEFAULT 0,
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS submissions (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  problem_id INTEGER NOT NULL REFERENCES problems(id),
  submission_set_id INTEGER NOT NULL REFERENCES submission_sets(id),
  completion_json TEXT NOT NULL DEFAULT '""',
  message TEXT NOT NULL DEFAULT '',
  score REAL NOT NULL DEFAULT 0,
  notes_json TEXT NOT NULL DEFAULT '""',
  is_example INTEGER NOT NULL DEFAULT 0,
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS evaluation_sets (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  model_id INTEGER NOT NULL REFERENCES models(id),
  name TEXT NOT NULL,
  notes_json TEXT NOT NULL DEFAULT '""',
  is_example INTEGER NOT NULL DEFAULT 0,
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS evaluations (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  submission_id INTEGER NOT NULL REFERENCES submissions(id),
  evaluation_set_id INTEGER NOT NULL REFERENCES evaluation_sets(id),
  completion_json TEXT NOT NULL DEFAULT '""',
  message TEXT NOT NULL DEFAULT '',
  score REAL NOT NULL DEFAULT 0,
  notes_json TEXT NOT NULL DEFAULT '""',
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);

-- Association relations (collection, member); one row per pair
CREATE TABLE IF NOT EXISTS problem_set_problems (
  problem_set_id INTEGER NOT NULL REFERENCES problem_sets(id),
  problem_id INTEGER NOT NULL REFERENCES problems(id),
  PRIMARY KEY (problem_set_id, problem_id)
);

CREATE TABLE IF NOT EXISTS submission_set_submissions (
  submission_set_id INTEGER NOT NULL REFERENCES submission_sets(id),
  submission_id INTEGER NOT NULL REFERENCES submissions(id),
  PRIMARY KEY (submission_set_id, submission_id)
);

CREATE TABLE IF NOT EXISTS evaluation_set_evaluations (
  evaluation_set_id INTEGER NOT NULL REFERENCES evaluation_sets(id),
  evaluation_id INTEGER NOT NULL REFERENCES evaluations(id),
  PRIMARY KEY (evaluation_set_id, evaluation_id)
);

CREATE INDEX IF NOT EXISTS idx_problems_set ON problems(problem_set_id);
CREATE INDEX IF NOT EXISTS idx_submissions_problem ON submissions(problem_id);
CREATE INDEX IF NOT EXISTS idx_submissions_set ON submissions(submission_set_id);
CREATE INDEX IF NOT EXISTS idx_evaluations_submission ON evaluations(submission_id);
CREATE INDEX IF NOT EXISTS idx_evaluations_set ON evaluations(evaluation_set_id);
"#;
