/*!

This is the long-form manual for `exam_grading` and `examgrade`.

## Input files

Two tables are needed:
* the **answer key**: the correct answer of each question, in the first data row.
  Any other row is ignored (a warning is logged).
* the **responses**: one row per student.

Both can be CSV files or Excel (`.xlsx`) workbooks. The first row of both holds the
column labels. These are typically the exports of Google Forms or Microsoft Forms quizzes.

### CSV

The first record is the header. The file may be in UTF-8 (with or without a byte order mark)
or in Latin-1, which is what some spreadsheet programs produce. Empty fields are blank answers.

### xlsx

The worksheet given with `--key-worksheet`, `--responses-worksheet` or `excelWorksheetName` is
used, otherwise the first worksheet of the workbook. Empty and error cells are blank answers.

## Question columns

A column holds the answers to a question if its label (surrounding spaces removed) follows one of
these conventions, tried in this order:

| convention         | examples                          |
|--------------------|-----------------------------------|
| number             | `7`, `7.`                         |
| question word      | `question_7`, `Question 7`, `pregunta_7` |
| letter P           | `P7`, `p7`                        |

Question numbers start at 1 and go up to `maxQuestion` (10000 by default). Columns numbered
above it are ignored with a warning.

Labels containing a score or comment marker (`[Score]`, `[Comments]`, `[Puntuación]`, ...) are
never question columns: online forms add one of these next to each question in quiz mode.

The key and the responses are matched by question number, so they may use different conventions.
A question whose key entry is blank, or that is missing from the key, is not graded.

## Answers

Answers are trimmed, uppercased and stripped of stray `.`, `,` and `;`, so that `a.`, `A` and
` a ` are the same answer. In the key, anything that is not then exactly one of the valid letters
(by default `A` to `E`) leaves the question out of the grading. With the `strict` key policy, such
an entry stops the grading instead.

For the students, an empty cell is an unanswered question. Any other mark that is not the
correct letter is an incorrect answer.

## Identity columns

The name, email and group of each student are read from the columns whose label matches one of
the candidates (exactly first, then as a case-insensitive substring):

| field | default candidates                              | placeholder     |
|-------|-------------------------------------------------|-----------------|
| name  | `Nombre completo`, `Full name`, `Nombre`        | `Student <row>` |
| email | `Nombre de usuario`, `Email`, `Correo`          | `No email`      |
| group | `Grupo`, `Group`                                | `No group`      |

Students without a usable group (blank, `nan`, `None` or the placeholder) are gathered in the
`Ungrouped` group of the statistics.

## Scores

For every student and every subject:
* percentage: correct answers divided by the graded questions, times 100, rounded to 2 decimals
* score: the same ratio on the score scale (10 by default)

A subject without any graded question has a percentage and a score of 0.

## Configuration

`examgrade` accepts a JSON configuration file with `--config`. File paths in it are relative to the
directory of the configuration file. All the keys except `outputSettings` are optional.

```json
{
  "outputSettings": {
    "examName": "Admission exam",
    "examDate": "2024-05-01",
    "outputDirectory": "reports"
  },
  "keySource": { "provider": "csv", "filePath": "key.csv" },
  "responsesSource": { "provider": "xlsx", "filePath": "responses.xlsx", "excelWorksheetName": "Form1" },
  "subjects": [
    { "name": "Physics", "firstQuestion": 1, "lastQuestion": 15 },
    { "name": "History", "firstQuestion": 16, "lastQuestion": 30 }
  ],
  "totalQuestions": 30,
  "validAnswers": ["A", "B", "C", "D"],
  "identityColumns": { "group": ["Section"] },
  "placeholders": { "ungrouped": "Unassigned" },
  "scoreScale": 100,
  "passingPercentage": 60,
  "keyPolicy": "strict",
  "maxQuestion": 200
}
```

Without `subjects`, the standard 110-question layout is used: Physics 1-15, History 16-30,
Mathematics 31-60, Biology 61-75, Reasoning 76-80, Chemistry 81-90, Spanish 91-110.
Questions outside all the subjects, or in several of them, are reported as warnings.

`keyPolicy` is `skipInvalid` (default) or `strict`.

## Outputs

* a console report with the results of each student (`--summary-only` hides the subjects),
  the statistics of each group and the hardest questions
* CSV reports in `--export-dir` (or `outputDirectory`): `results.csv`, `error_matrix.csv`,
  `errors_by_subject.csv`, `hardest_questions.csv` and `group_metrics.csv`
* a JSON summary with `--out <file>` or `--out stdout`. With `--reference <file>`, the summary is
  compared with a previous one and any difference is reported as an error.

`--diagnose` only inspects the input files. For the answer key, it lists the valid, blank and
invalid entries. For the responses, it shows the identity columns found (or not found), the
number of question columns, and the first three students with their group and first five
answers. This explains why a student is reported as `Student <row>` or in `Ungrouped`.

 */
