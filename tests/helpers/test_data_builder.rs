// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================
// 每个构建器直接写入 SQLite（模拟上游管线入库）
// ==========================================

use rusqlite::{params, Connection};

pub const RACE_DATE: &str = "2025-11-26";

// ==========================================
// 场次构建器
// ==========================================

pub struct RaceBuilder {
    race_date: String,
    venue: String,
    race_no: u32,
    distance_m: Option<u32>,
    race_name: Option<String>,
}

impl RaceBuilder {
    pub fn new(venue: &str, race_no: u32) -> Self {
        Self {
            race_date: RACE_DATE.to_string(),
            venue: venue.to_string(),
            race_no,
            distance_m: None,
            race_name: None,
        }
    }

    pub fn date(mut self, date: &str) -> Self {
        self.race_date = date.to_string();
        self
    }

    pub fn distance(mut self, distance_m: u32) -> Self {
        self.distance_m = Some(distance_m);
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.race_name = Some(name.to_string());
        self
    }

    pub fn insert(self, conn: &Connection) {
        conn.execute(
            "INSERT INTO racecard_races (race_date, venue_code, race_no, distance_m, race_name_zh)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![self.race_date, self.venue, self.race_no, self.distance_m, self.race_name],
        )
        .unwrap();
    }
}

// ==========================================
// 出赛马构建器
// ==========================================

pub struct EntryBuilder {
    race_date: String,
    race_no: u32,
    horse_no: u32,
    horse_id: Option<String>,
    horse_name: Option<String>,
    draw: Option<u32>,
    jockey: Option<String>,
    scratched: bool,
}

impl EntryBuilder {
    pub fn new(race_no: u32, horse_no: u32, horse_id: &str) -> Self {
        Self {
            race_date: RACE_DATE.to_string(),
            race_no,
            horse_no,
            horse_id: Some(horse_id.to_string()),
            horse_name: Some(format!("馬{}", horse_no)),
            draw: Some(horse_no),
            jockey: None,
            scratched: false,
        }
    }

    pub fn jockey(mut self, jockey: &str) -> Self {
        self.jockey = Some(jockey.to_string());
        self
    }

    pub fn draw(mut self, draw: u32) -> Self {
        self.draw = Some(draw);
        self
    }

    pub fn scratched(mut self) -> Self {
        self.scratched = true;
        self
    }

    pub fn insert(self, conn: &Connection) {
        conn.execute(
            "INSERT INTO racecard_entries
               (race_date, race_no, horse_no, horse_id, horse_name_zh, draw, jockey_zh, scratched)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                self.race_date,
                self.race_no,
                self.horse_no,
                self.horse_id,
                self.horse_name,
                self.draw,
                self.jockey,
                self.scratched as i64,
            ],
        )
        .unwrap();
    }
}

// ==========================================
// 组合统计构建器
// ==========================================

pub struct ScoreBuilder {
    race_date: String,
    venue: String,
    race_no: u32,
    horse_id: String,
    metric_code: String,
    runs: Option<i64>,
    win_count: Option<i64>,
    win_pct: Option<f64>,
    place_pct: Option<f64>,
    score_final: Option<f64>,
}

impl ScoreBuilder {
    pub fn new(venue: &str, race_no: u32, horse_id: &str, metric_code: &str) -> Self {
        Self {
            race_date: RACE_DATE.to_string(),
            venue: venue.to_string(),
            race_no,
            horse_id: horse_id.to_string(),
            metric_code: metric_code.to_string(),
            runs: None,
            win_count: None,
            win_pct: None,
            place_pct: None,
            score_final: None,
        }
    }

    pub fn runs(mut self, runs: i64, wins: i64) -> Self {
        self.runs = Some(runs);
        self.win_count = Some(wins);
        self
    }

    pub fn win_pct(mut self, pct: f64) -> Self {
        self.win_pct = Some(pct);
        self
    }

    pub fn place_pct(mut self, pct: f64) -> Self {
        self.place_pct = Some(pct);
        self
    }

    pub fn score_final(mut self, score: f64) -> Self {
        self.score_final = Some(score);
        self
    }

    pub fn insert(self, conn: &Connection) {
        conn.execute(
            "INSERT INTO race_metric_scores
               (race_date, venue_code, race_no, horse_id, metric_code,
                runs, win_cnt, win_pct, place_pct, score_final)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                self.race_date,
                self.venue,
                self.race_no,
                self.horse_id,
                self.metric_code,
                self.runs,
                self.win_count,
                self.win_pct,
                self.place_pct,
                self.score_final,
            ],
        )
        .unwrap();
    }
}

// ==========================================
// 马匹档案构建器
// ==========================================

pub struct HorseBuilder {
    horse_id: String,
    name: Option<String>,
    sex: Option<String>,
    owner: Option<String>,
    trainer: Option<String>,
    current_rating: Option<i64>,
    updated_at: Option<String>,
}

impl HorseBuilder {
    pub fn new(horse_id: &str) -> Self {
        Self {
            horse_id: horse_id.to_string(),
            name: None,
            sex: None,
            owner: None,
            trainer: None,
            current_rating: None,
            updated_at: Some("2025-01-01 00:00:00".to_string()),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn sex(mut self, sex: &str) -> Self {
        self.sex = Some(sex.to_string());
        self
    }

    pub fn owner(mut self, owner: &str) -> Self {
        self.owner = Some(owner.to_string());
        self
    }

    pub fn trainer(mut self, trainer: &str) -> Self {
        self.trainer = Some(trainer.to_string());
        self
    }

    pub fn rating(mut self, rating: i64) -> Self {
        self.current_rating = Some(rating);
        self
    }

    pub fn updated_at(mut self, ts: &str) -> Self {
        self.updated_at = Some(ts.to_string());
        self
    }

    pub fn insert(self, conn: &Connection) {
        conn.execute(
            "INSERT INTO horse_profiles
               (horse_id, name, sex, owner, trainer, current_rating, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.horse_id,
                self.name,
                self.sex,
                self.owner,
                self.trainer,
                self.current_rating,
                self.updated_at,
            ],
        )
        .unwrap();
    }
}
