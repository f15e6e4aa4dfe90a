//! Built-in story: Mia and her red pencil

use super::{CorrectOption, Question, Script, Step, WrongOption};

fn question(
    question_id: u32,
    correct: (&str, &str, &str),
    wrong: (&str, &str),
) -> Question {
    let (text, prompt, response) = correct;
    let (wrong_text, explanation) = wrong;
    Question {
        question_id,
        correct: CorrectOption {
            text: text.to_string(),
            prompt: prompt.to_string(),
            response: response.to_string(),
        },
        wrong: WrongOption {
            text: wrong_text.to_string(),
            explanation: explanation.to_string(),
        },
    }
}

/// The default script: an opening, five story/question pairs and a closing
#[allow(clippy::too_many_lines)] // Static content table
pub fn mia_story() -> Script {
    let steps = vec![
        Step::narration(
            "Hi! I'm Teacher Bot. We're going to read a story about Mia and help her by choosing the best sentences for a picture. Are you ready?",
            "Start",
        ),
        Step::narration(
            "Mia is in Year 1 and loves to draw. One day, she can't find her special red pencil.",
            "Next",
        ),
        Step::question(
            "What is Mia looking for?",
            question(
                1,
                (
                    "A: Mia is looking for her red pencil.",
                    "Full-colour, child-friendly cartoon of a Malaysian primary school girl named Mia (age 7) looking sad because she cannot find her red pencil. She is in a bright classroom. The red pencil is not in the picture.",
                    "That's right! Mia is looking for her red pencil. Here is the picture you described.",
                ),
                (
                    "B: Mia is looking for a book.",
                    "Not quite! Remember, the story tells us what Mia lost. Read the story again to find the answer. You can do it!",
                ),
            ),
        ),
        Step::narration(
            "First, Mia looks in her pencil case. It's not there! Then, she looks under her desk. It's not there either.",
            "Next",
        ),
        Step::question(
            "Where did Mia look for her pencil?",
            question(
                2,
                (
                    "A: Mia looks in her pencil case and under her desk.",
                    "Medium-shot cartoon of Mia (Malaysian girl, age 7) first looking in her pencil case, then bending down to look under her school desk. Show a curious and slightly worried expression. The red pencil is not there. Bright classroom setting.",
                    "Excellent! Mia looked in her pencil case and under her desk. Here is the picture!",
                ),
                (
                    "B: Mia looks in her school bag.",
                    "Good try! The story tells us two places Mia looked. Can you find them? Read the story again and give it another go!",
                ),
            ),
        ),
        Step::narration(
            "Mia asks her friend, Ali, 'Can you help me?' Ali says, 'Yes! Let’s go to the art corner to look.'",
            "Next",
        ),
        Step::question(
            "Who does Mia ask for help?",
            question(
                3,
                (
                    "A: Mia asks her friend Ali for help.",
                    "Mid-shot, child-safe cartoon of Mia (girl, age 7) asking her friend Ali (Malaysian boy, age 7) for help. Ali should have a friendly, helpful expression. They are in a classroom.",
                    "Yes, Ali is a great friend! You chose the perfect sentence for this picture.",
                ),
                (
                    "B: Mia asks her teacher.",
                    "That's a good idea, but Mia asked someone else in the story. Who was it? Read the story again to find out. You're doing great!",
                ),
            ),
        ),
        Step::narration(
            "They go to the art corner. And look! Mia finds her red pencil on a big table.",
            "Next",
        ),
        Step::question(
            "Where did Mia find her red pencil?",
            question(
                4,
                (
                    "B: Mia finds the red pencil in the art corner.",
                    "Full-colour, joyful cartoon of Mia (girl, age 7) finding her red pencil on a table in the school's art corner. Ali (boy, age 7) is smiling next to her. Show paint jars, brushes, and coloured paper on the table to make the location clear. Both children look happy.",
                    "That's it! She found it in the art corner. What a happy picture!",
                ),
                (
                    "A: Mia finds the pencil in the library.",
                    "Almost! The story tells us a special place where they found the pencil. Read the story again to see where they went. Try again!",
                ),
            ),
        ),
        Step::narration(
            "Mia is very happy. She smiles and says, 'Thank you, Ali!'",
            "Next",
        ),
        Step::question(
            "What does Mia say to Ali?",
            question(
                5,
                (
                    "A: Mia says 'Thank you' to Ali.",
                    "Close-up shot, child-safe cartoon of Mia (girl, age 7) smiling happily and saying 'Thank you!' to Ali (boy, age 7). Ali is smiling back. They are in the art corner with colourful supplies in the background. Show warmth and friendship.",
                    "Perfect! Saying thank you is very important. You finished the story!",
                ),
                (
                    "B: Mia says 'Let's play'.",
                    "What do you say when a friend helps you? The story tells us what Mia said. Read the last part of the story again. You're almost there!",
                ),
            ),
        ),
        Step::closing(
            "Yay, you did it! You chose all the best sentences to tell Mia's story. Remember, a good sentence for a picture tells us WHO is in it, WHERE they are, and WHAT they are doing. Press 'Play Again' to start over.",
            "Play Again",
        ),
    ];

    Script::new(steps).expect("built-in story is a valid script")
}
